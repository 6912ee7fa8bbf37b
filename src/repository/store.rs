// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Store Abstraction
//!
//! The store owns the node inventory. Readers get immutable snapshots;
//! writers hand over a whole [`NodeTransaction`] which is applied atomically.
//!
//! # Architecture
//!
//! ```text
//! Activator → NodeTransaction → commit → NodeStore → published NodeList
//!                                             ↓
//!                                        snapshot()
//! ```
//!
//! # Commit Requirements
//!
//! 1. **Atomic**: every write group is applied or none is
//! 2. **Ordered**: write groups are applied in staging order
//! 3. **Validated**: transitions, ownership, node invariants, hostname
//!    uniqueness and child references are checked against the inventory as
//!    it stands after the preceding groups
//! 4. **Isolated**: snapshots taken before a commit never see its writes

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

use super::{NodeList, NodeOperation, NodeTransaction};
use crate::domain::{Hostname, Node, NodeState};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::state_machine::StateInvariant;

/// Storage of the node inventory
pub trait NodeStore: Send + Sync {
    /// Consistent view of all nodes, unaffected by later commits
    fn snapshot(&self) -> NodeList;

    /// Apply every write group of `transaction`, or none of them
    fn commit(&self, transaction: NodeTransaction) -> RepositoryResult<()>;
}

/// Published inventory: the map used for validation and the list handed to readers
struct Inventory {
    nodes: BTreeMap<Hostname, Node>,
    list: NodeList,
}

impl Inventory {
    fn new(nodes: BTreeMap<Hostname, Node>) -> Self {
        let list = nodes.values().cloned().collect();
        Self { nodes, list }
    }
}

/// Copy-on-write in-memory node store
///
/// Commits work on a private copy of the inventory and swap it in only when
/// every write group validates. Snapshots share the published list.
pub struct InMemoryNodeStore {
    inventory: RwLock<Inventory>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self {
            inventory: RwLock::new(Inventory::new(BTreeMap::new())),
        }
    }

    /// Store seeded with `nodes`, validated like any other insert
    pub fn with_nodes(nodes: Vec<Node>) -> RepositoryResult<Self> {
        let store = Self::new();
        let mut transaction = NodeTransaction::new();
        transaction.add(nodes);
        store.commit(transaction)?;
        Ok(store)
    }
}

impl Default for InMemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryNodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryNodeStore")
            .field("nodes", &self.inventory.read().nodes.len())
            .finish()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn snapshot(&self) -> NodeList {
        self.inventory.read().list.clone()
    }

    fn commit(&self, transaction: NodeTransaction) -> RepositoryResult<()> {
        let id = transaction.id();
        let groups = transaction.len();

        // Held across validation so commits are serialized against each other
        let mut inventory = self.inventory.write();
        let mut working = inventory.nodes.clone();

        for operation in transaction.into_operations() {
            if let Err(error) = apply(&mut working, operation) {
                warn!(transaction = %id, error = %error, "Rejected node transaction");
                return Err(error);
            }
        }

        *inventory = Inventory::new(working);
        info!(
            transaction = %id,
            groups,
            nodes = inventory.nodes.len(),
            "Committed node transaction"
        );
        Ok(())
    }
}

fn apply(nodes: &mut BTreeMap<Hostname, Node>, operation: NodeOperation) -> RepositoryResult<()> {
    match operation {
        NodeOperation::Add(added) => add(nodes, added),
        NodeOperation::Write { target, nodes: written } => write(nodes, target, written),
        NodeOperation::Remove(hostnames) => remove(nodes, hostnames),
    }
}

fn add(nodes: &mut BTreeMap<Hostname, Node>, added: Vec<Node>) -> RepositoryResult<()> {
    for node in added {
        node.check_invariants()?;
        if nodes.contains_key(node.hostname()) {
            return Err(RepositoryError::DuplicateHostname(node.hostname().clone()));
        }
        nodes.insert(node.hostname().clone(), node);
    }
    Ok(())
}

fn write(
    nodes: &mut BTreeMap<Hostname, Node>,
    target: NodeState,
    written: Vec<Node>,
) -> RepositoryResult<()> {
    for node in written {
        if node.state() != target {
            return Err(RepositoryError::StateMismatch {
                hostname: node.hostname().clone(),
                expected: target,
                actual: node.state(),
            });
        }
        node.check_invariants()?;

        let current = nodes
            .get(node.hostname())
            .ok_or_else(|| RepositoryError::UnknownNode(node.hostname().clone()))?;

        if !current.state().can_transition_to(&target) {
            return Err(RepositoryError::IllegalTransition {
                hostname: node.hostname().clone(),
                from: current.state(),
                to: target,
            });
        }

        if let (Some(owner), Some(requested)) = (current.owner(), node.owner()) {
            if owner != requested {
                return Err(RepositoryError::OwnershipConflict {
                    hostname: node.hostname().clone(),
                    owner: owner.clone(),
                    requested: requested.clone(),
                    state: current.state(),
                });
            }
        }

        nodes.insert(node.hostname().clone(), node);
    }
    Ok(())
}

fn remove(nodes: &mut BTreeMap<Hostname, Node>, hostnames: Vec<Hostname>) -> RepositoryResult<()> {
    for hostname in &hostnames {
        if nodes.remove(hostname).is_none() {
            return Err(RepositoryError::UnknownNode(hostname.clone()));
        }
    }

    // Checked after the whole group so a host and its children can go together
    for hostname in hostnames {
        let children: Vec<Hostname> = nodes
            .values()
            .filter(|node| node.parent_hostname() == Some(&hostname))
            .map(|node| node.hostname().clone())
            .collect();
        if !children.is_empty() {
            return Err(RepositoryError::HasChildren { hostname, children });
        }
    }
    Ok(())
}
