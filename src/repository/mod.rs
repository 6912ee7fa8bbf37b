// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Repository
//!
//! Facade over the node store, the per-application locks and the clock.
//!
//! Two kinds of callers use it:
//!
//! - The activation core reads snapshots, takes application locks and
//!   *stages* writes into a caller-owned [`NodeTransaction`] with
//!   [`NodeRepository::activate`] and [`NodeRepository::deactivate`]. It
//!   never commits.
//! - Inventory operations ([`NodeRepository::reserve`],
//!   [`NodeRepository::fail`], ...) build and commit their own
//!   transaction, atomically.
//!
//! # Example
//!
//! ```rust
//! use cim_node_repository::config::NodeRepositoryConfig;
//! use cim_node_repository::repository::NodeRepository;
//!
//! let repository = NodeRepository::in_memory(NodeRepositoryConfig::new("dev"));
//! assert!(repository.list().is_empty());
//! ```

pub mod lock;
pub mod node_list;
pub mod store;
pub mod transaction;

pub use lock::{ApplicationLock, ApplicationLocks, LockError};
pub use node_list::NodeList;
pub use store::{InMemoryNodeStore, NodeStore};
pub use transaction::{NodeOperation, NodeTransaction};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::NodeRepositoryConfig;
use crate::domain::{ApplicationId, ClusterMembership, Hostname, Node, NodeState};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::provisioning::ProvisionedHost;
use crate::state_machine::{NodeCommand, StateMachine};

/// Node repository facade
pub struct NodeRepository {
    store: Arc<dyn NodeStore>,
    locks: ApplicationLocks,
    clock: Arc<dyn Clock>,
    config: NodeRepositoryConfig,
}

impl NodeRepository {
    pub fn new(
        store: Arc<dyn NodeStore>,
        clock: Arc<dyn Clock>,
        config: NodeRepositoryConfig,
    ) -> Self {
        Self {
            store,
            locks: ApplicationLocks::new(config.lock_timeout),
            clock,
            config,
        }
    }

    /// Empty in-memory repository on the system clock
    pub fn in_memory(config: NodeRepositoryConfig) -> Self {
        Self::new(Arc::new(InMemoryNodeStore::new()), Arc::new(SystemClock), config)
    }

    /// Snapshot of every node
    pub fn list(&self) -> NodeList {
        self.store.snapshot()
    }

    /// Current record of `hostname`
    pub fn node(&self, hostname: &Hostname) -> Option<Node> {
        self.list().node(hostname).cloned()
    }

    /// Take the lock of `application`
    pub fn lock(&self, application: &ApplicationId) -> Result<ApplicationLock, LockError> {
        self.locks.lock(application)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &NodeRepositoryConfig {
        &self.config
    }

    /// Apply a staged transaction
    pub fn commit(&self, transaction: NodeTransaction) -> RepositoryResult<()> {
        self.store.commit(transaction)
    }

    /// Stage moving `nodes` to active
    pub fn activate(&self, nodes: Vec<Node>, transaction: &mut NodeTransaction) {
        self.stage(NodeState::Active, nodes, transaction);
    }

    /// Stage moving `nodes` to inactive
    pub fn deactivate(&self, nodes: Vec<Node>, transaction: &mut NodeTransaction) {
        self.stage(NodeState::Inactive, nodes, transaction);
    }

    fn stage(&self, target: NodeState, nodes: Vec<Node>, transaction: &mut NodeTransaction) {
        let now = self.clock.now();
        let nodes: Vec<Node> = nodes
            .into_iter()
            .map(|node| node.with_state(target, now))
            .collect();
        debug!(
            transaction = %transaction.id(),
            state = %target,
            count = nodes.len(),
            "Staged node writes"
        );
        transaction.write(target, nodes);
    }

    /// Insert new nodes
    pub fn add_nodes(&self, nodes: Vec<Node>) -> RepositoryResult<Vec<Node>> {
        let mut transaction = NodeTransaction::new();
        transaction.add(nodes.clone());
        self.commit(transaction)?;
        info!(zone = %self.config.zone, count = nodes.len(), "Added nodes");
        Ok(nodes)
    }

    /// Insert the host and child records of freshly provisioned hosts
    pub fn add_provisioned_hosts(
        &self,
        hosts: &[ProvisionedHost],
    ) -> RepositoryResult<Vec<Node>> {
        let now = self.clock.now();
        let mut nodes = Vec::with_capacity(hosts.len() * 2);
        for host in hosts {
            nodes.push(host.host_node(now)?);
            nodes.push(host.child_node(now)?);
        }
        self.add_nodes(nodes)
    }

    /// Reserve nodes for `application`
    ///
    /// A node is available when it is provisioned, or inactive and already
    /// owned by `application`. All requests are reserved or none.
    pub fn reserve(
        &self,
        application: &ApplicationId,
        requests: &[(Hostname, ClusterMembership)],
    ) -> RepositoryResult<Vec<Node>> {
        let _lock = self.lock(application)?;
        let snapshot = self.list();
        let now = self.clock.now();

        let reserved = requests
            .iter()
            .map(|(hostname, membership)| -> RepositoryResult<Node> {
                let node = snapshot
                    .node(hostname)
                    .ok_or_else(|| RepositoryError::UnknownNode(hostname.clone()))?;
                check_reservable(node, application)?;
                Ok(node.allocate(application.clone(), membership.clone(), now))
            })
            .collect::<RepositoryResult<Vec<Node>>>()?;

        let mut transaction = NodeTransaction::new();
        transaction.write(NodeState::Reserved, reserved.clone());
        self.commit(transaction)?;
        info!(
            zone = %self.config.zone,
            application = %application,
            count = reserved.len(),
            "Reserved nodes"
        );
        Ok(reserved)
    }

    /// Release `hostname` back to provisioned, clearing its allocation
    ///
    /// This is how reservations expire.
    pub fn deallocate(&self, hostname: &Hostname) -> RepositoryResult<Node> {
        self.apply_command(hostname, NodeCommand::Deallocate)
    }

    pub fn fail(&self, hostname: &Hostname) -> RepositoryResult<Node> {
        self.apply_command(hostname, NodeCommand::Fail)
    }

    pub fn park(&self, hostname: &Hostname) -> RepositoryResult<Node> {
        self.apply_command(hostname, NodeCommand::Park)
    }

    pub fn deprovision(&self, hostname: &Hostname) -> RepositoryResult<Node> {
        self.apply_command(hostname, NodeCommand::Deprovision)
    }

    fn apply_command(&self, hostname: &Hostname, command: NodeCommand) -> RepositoryResult<Node> {
        let owner = self
            .node(hostname)
            .ok_or_else(|| RepositoryError::UnknownNode(hostname.clone()))?
            .owner()
            .cloned();
        // Allocated nodes change under their owner's lock
        let _lock = owner.as_ref().map(|owner| self.lock(owner)).transpose()?;

        let node = self
            .node(hostname)
            .ok_or_else(|| RepositoryError::UnknownNode(hostname.clone()))?;
        let (target, output) = node.state().transition(&command)?;
        if output.is_critical {
            warn!(
                zone = %self.config.zone,
                hostname = %hostname,
                from = %node.state(),
                to = %target,
                warnings = ?output.warnings,
                "Critical node transition"
            );
        } else if !output.warnings.is_empty() {
            info!(hostname = %hostname, warnings = ?output.warnings, "Node transition");
        }

        let moved = node.with_state(target, self.clock.now());
        let moved = if target.is_allocated() {
            moved
        } else {
            moved.without_allocation()
        };

        let mut transaction = NodeTransaction::new();
        transaction.write(target, vec![moved.clone()]);
        self.commit(transaction)?;
        info!(hostname = %hostname, from = %node.state(), to = %target, "Moved node");
        Ok(moved)
    }

    /// Delete deprovisioned records
    ///
    /// Fails if any node is not deprovisioned or is still a parent of a
    /// remaining node.
    pub fn remove(&self, hostnames: &[Hostname]) -> RepositoryResult<()> {
        let snapshot = self.list();
        for hostname in hostnames {
            let node = snapshot
                .node(hostname)
                .ok_or_else(|| RepositoryError::UnknownNode(hostname.clone()))?;
            if node.state() != NodeState::Deprovisioned {
                return Err(RepositoryError::NotAvailable {
                    hostname: hostname.clone(),
                    reason: format!("it is {}; only deprovisioned nodes are removed", node.state()),
                });
            }
        }

        let mut transaction = NodeTransaction::new();
        transaction.remove(hostnames.to_vec());
        self.commit(transaction)?;
        info!(zone = %self.config.zone, count = hostnames.len(), "Removed nodes");
        Ok(())
    }

    /// Overwrite existing records, one write group per state
    pub fn write(&self, nodes: Vec<Node>) -> RepositoryResult<()> {
        let mut transaction = NodeTransaction::new();
        for (state, group) in group_by_state(nodes) {
            transaction.write(state, group);
        }
        self.commit(transaction)
    }
}

impl fmt::Debug for NodeRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRepository")
            .field("locks", &self.locks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn check_reservable(node: &Node, application: &ApplicationId) -> RepositoryResult<()> {
    let reason = match (node.state(), node.owner()) {
        (NodeState::Provisioned, _) => return Ok(()),
        (NodeState::Inactive, Some(owner)) if owner == application => return Ok(()),
        (state, Some(owner)) => format!("it is {} and owned by {}", state, owner),
        (state, None) => format!("it is {}", state),
    };
    Err(RepositoryError::NotAvailable {
        hostname: node.hostname().clone(),
        reason,
    })
}

/// Groups in order of first appearance
fn group_by_state(nodes: Vec<Node>) -> Vec<(NodeState, Vec<Node>)> {
    let mut groups: Vec<(NodeState, Vec<Node>)> = Vec::new();
    for node in nodes {
        match groups.iter_mut().find(|(state, _)| *state == node.state()) {
            Some((_, group)) => group.push(node),
            None => groups.push((node.state(), vec![node])),
        }
    }
    groups
}
