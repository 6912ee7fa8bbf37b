// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Entity
//!
//! A node is one machine slot: a bare-metal host, a virtual machine or a
//! container on a host. Nodes are immutable values. Every change produces a
//! new node, so a snapshot of nodes can be shared between threads and read
//! without locking while new versions are written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use super::invariants::{validate_node, ValidationError, ValidationResult};
use super::{
    Allocation, ApplicationId, ClusterMembership, Flavor, History, HistoryEventType, Hostname,
    NodeState, NodeType,
};
use crate::state_machine::StateInvariant;

/// Node Entity
///
/// # Invariants
/// - Allocated (has an allocation) iff state is reserved, active or inactive
/// - Never its own parent
///
/// `parent_hostname` is a lookup key into the same inventory, not an
/// ownership pointer; the parent may be absent from the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    hostname: Hostname,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    parent_hostname: Option<Hostname>,

    node_type: NodeType,

    flavor: Flavor,

    state: NodeState,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    allocation: Option<Allocation>,

    #[serde(skip_serializing_if = "BTreeSet::is_empty", default)]
    ip_addresses: BTreeSet<IpAddr>,

    #[serde(default)]
    history: History,
}

impl Node {
    /// Create a newly provisioned, unallocated node
    pub fn create(
        hostname: Hostname,
        parent_hostname: Option<Hostname>,
        flavor: Flavor,
        node_type: NodeType,
        at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let builder = Self::builder(hostname, flavor)
            .node_type(node_type)
            .history(History::provisioned_at(at));
        match parent_hostname {
            Some(parent) => builder.parent(parent).build(),
            None => builder.build(),
        }
    }

    /// Builder for nodes in any state, validated on `build`
    pub fn builder(hostname: Hostname, flavor: Flavor) -> NodeBuilder {
        NodeBuilder::new(hostname, flavor)
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn parent_hostname(&self) -> Option<&Hostname> {
        self.parent_hostname.as_ref()
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn flavor(&self) -> &Flavor {
        &self.flavor
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn allocation(&self) -> Option<&Allocation> {
        self.allocation.as_ref()
    }

    pub fn ip_addresses(&self) -> &BTreeSet<IpAddr> {
        &self.ip_addresses
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The application owning this node, if allocated
    pub fn owner(&self) -> Option<&ApplicationId> {
        self.allocation.as_ref().map(Allocation::owner)
    }

    pub fn is_owned_by(&self, application: &ApplicationId) -> bool {
        self.owner() == Some(application)
    }

    /// Whether this node is allocated and marked for retirement
    pub fn is_retired(&self) -> bool {
        self.allocation
            .as_ref()
            .map(|allocation| allocation.membership().retired())
            .unwrap_or(false)
    }

    /// Returns a copy in `state`, recording the history event if the state changes
    ///
    /// The allocation is untouched; callers leaving the allocated states must
    /// also drop it.
    pub fn with_state(&self, state: NodeState, at: DateTime<Utc>) -> Self {
        if state == self.state {
            return self.clone();
        }
        Self {
            state,
            history: self.history.with(HistoryEventType::for_state(state), at),
            ..self.clone()
        }
    }

    /// Returns a copy reserved for `owner`
    pub fn allocate(
        &self,
        owner: ApplicationId,
        membership: ClusterMembership,
        at: DateTime<Utc>,
    ) -> Self {
        self.with_allocation(Allocation::new(owner, membership))
            .with_state(NodeState::Reserved, at)
    }

    pub fn with_allocation(&self, allocation: Allocation) -> Self {
        Self {
            allocation: Some(allocation),
            ..self.clone()
        }
    }

    pub fn without_allocation(&self) -> Self {
        Self {
            allocation: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the given membership; unallocated nodes are returned unchanged
    pub fn with_membership(&self, membership: ClusterMembership) -> Self {
        match &self.allocation {
            Some(allocation) => self.with_allocation(allocation.with_membership(membership)),
            None => self.clone(),
        }
    }

    /// Returns a copy marked as retired at `at`
    ///
    /// Unallocated and already retired nodes are returned unchanged, keeping
    /// the first retirement time.
    pub fn retire(&self, at: DateTime<Utc>) -> Self {
        match &self.allocation {
            Some(allocation) if !allocation.membership().retired() => Self {
                allocation: Some(allocation.retire()),
                history: self.history.with(HistoryEventType::Retired, at),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Returns a copy which is not retired; unallocated nodes are returned unchanged
    pub fn unretire(&self) -> Self {
        match &self.allocation {
            Some(allocation) => self.with_allocation(allocation.unretire()),
            None => self.clone(),
        }
    }

    pub fn with_flavor(&self, flavor: Flavor) -> Self {
        Self {
            flavor,
            ..self.clone()
        }
    }

    pub fn with_ip_addresses(&self, ip_addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            ip_addresses: ip_addresses.into_iter().collect(),
            ..self.clone()
        }
    }
}

impl StateInvariant for Node {
    type Error = ValidationError;

    fn check_invariants(&self) -> ValidationResult {
        validate_node(self)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.hostname, self.state)?;
        if let Some(allocation) = &self.allocation {
            write!(f, " owned by {} as {}", allocation.owner(), allocation.membership())?;
        }
        Ok(())
    }
}

/// Builder for [`Node`]
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    fn new(hostname: Hostname, flavor: Flavor) -> Self {
        Self {
            node: Node {
                hostname,
                parent_hostname: None,
                node_type: NodeType::Tenant,
                flavor,
                state: NodeState::Provisioned,
                allocation: None,
                ip_addresses: BTreeSet::new(),
                history: History::default(),
            },
        }
    }

    pub fn parent(mut self, parent_hostname: Hostname) -> Self {
        self.node.parent_hostname = Some(parent_hostname);
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node.node_type = node_type;
        self
    }

    pub fn state(mut self, state: NodeState) -> Self {
        self.node.state = state;
        self
    }

    pub fn allocation(mut self, allocation: Allocation) -> Self {
        self.node.allocation = Some(allocation);
        self
    }

    pub fn ip_addresses(mut self, ip_addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        self.node.ip_addresses = ip_addresses.into_iter().collect();
        self
    }

    pub fn history(mut self, history: History) -> Self {
        self.node.history = history;
        self
    }

    /// Build the node, checking its invariants
    pub fn build(self) -> Result<Node, ValidationError> {
        self.node.check_invariants()?;
        Ok(self.node)
    }
}
