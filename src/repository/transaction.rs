// Copyright (c) 2025 - Cowboy AI, Inc.
//! Staged Node Writes
//!
//! A [`NodeTransaction`] is an ordered batch of write groups owned by the
//! caller. Staging appends to it; nothing becomes visible until the caller
//! commits it to a [`NodeStore`](super::NodeStore), which applies every
//! group in order or none of them.

use uuid::Uuid;

use crate::domain::{Hostname, Node, NodeState};

/// One write group of a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOperation {
    /// Insert new records
    Add(Vec<Node>),

    /// Overwrite existing records; every node is in `target`
    Write { target: NodeState, nodes: Vec<Node> },

    /// Delete records
    Remove(Vec<Hostname>),
}

impl NodeOperation {
    /// Nodes written by this group (none for removals)
    pub fn nodes(&self) -> &[Node] {
        match self {
            Self::Add(nodes) | Self::Write { nodes, .. } => nodes,
            Self::Remove(_) => &[],
        }
    }

    /// Hostnames touched by this group
    pub fn hostnames(&self) -> Vec<&Hostname> {
        match self {
            Self::Add(nodes) | Self::Write { nodes, .. } => {
                nodes.iter().map(Node::hostname).collect()
            }
            Self::Remove(hostnames) => hostnames.iter().collect(),
        }
    }
}

/// Ordered, caller-owned batch of node writes
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTransaction {
    id: Uuid,
    operations: Vec<NodeOperation>,
}

impl NodeTransaction {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            operations: Vec::new(),
        }
    }

    /// Identifier for correlating log lines of one transaction
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn add(&mut self, nodes: Vec<Node>) -> &mut Self {
        self.operations.push(NodeOperation::Add(nodes));
        self
    }

    pub fn write(&mut self, target: NodeState, nodes: Vec<Node>) -> &mut Self {
        self.operations.push(NodeOperation::Write { target, nodes });
        self
    }

    pub fn remove(&mut self, hostnames: Vec<Hostname>) -> &mut Self {
        self.operations.push(NodeOperation::Remove(hostnames));
        self
    }

    pub fn operations(&self) -> &[NodeOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<NodeOperation> {
        self.operations
    }

    /// Number of staged write groups
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for NodeTransaction {
    fn default() -> Self {
        Self::new()
    }
}
