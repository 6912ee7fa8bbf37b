// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Snapshot and Queries
//!
//! A [`NodeList`] is an immutable, point-in-time view of nodes. Filters
//! return new lists and never observe writes committed after the snapshot
//! was taken.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{ApplicationId, Hostname, Node, NodeState};

/// Immutable list of nodes
#[derive(Debug, Clone)]
pub struct NodeList {
    nodes: Arc<[Node]>,
}

impl NodeList {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into(),
        }
    }

    fn matching(&self, predicate: impl Fn(&Node) -> bool) -> Self {
        Self::new(
            self.nodes
                .iter()
                .filter(|node| predicate(node))
                .cloned()
                .collect(),
        )
    }

    /// Nodes allocated to `application`
    pub fn owner(&self, application: &ApplicationId) -> Self {
        self.matching(|node| node.is_owned_by(application))
    }

    /// Nodes in `state`
    pub fn state(&self, state: NodeState) -> Self {
        self.matching(|node| node.state() == state)
    }

    /// Nodes in any of `states`
    pub fn states(&self, states: &[NodeState]) -> Self {
        self.matching(|node| states.contains(&node.state()))
    }

    /// Allocated nodes marked for retirement
    pub fn retired(&self) -> Self {
        self.matching(Node::is_retired)
    }

    pub fn not_retired(&self) -> Self {
        self.matching(|node| !node.is_retired())
    }

    /// Nodes running on `parent`
    pub fn children_of(&self, parent: &Hostname) -> Self {
        self.matching(|node| node.parent_hostname() == Some(parent))
    }

    pub fn node(&self, hostname: &Hostname) -> Option<&Node> {
        self.nodes.iter().find(|node| node.hostname() == hostname)
    }

    /// The parent of `node`, if it has one and it is in this list
    pub fn parent_of(&self, node: &Node) -> Option<&Node> {
        self.node(node.parent_hostname()?)
    }

    pub fn hostnames(&self) -> BTreeSet<Hostname> {
        self.nodes.iter().map(|node| node.hostname().clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.nodes.to_vec()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl Default for NodeList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<Node>> for NodeList {
    fn from(nodes: Vec<Node>) -> Self {
        Self::new(nodes)
    }
}

impl FromIterator<Node> for NodeList {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
