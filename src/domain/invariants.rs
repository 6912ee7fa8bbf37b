// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Node and Activation Invariants
//!
//! All functions here are pure: no I/O, no clock, no mutation. They return
//! every violation they find so callers can report them together.
//!
//! # Invariant Categories
//!
//! 1. **Node invariants**: allocation matches state, no self-parenting
//! 2. **Coverage**: requested hosts are explained by candidate nodes
//! 3. **Parent liveness**: guests are only activated on active parents

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use super::{Hostname, Node, NodeState};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Node invariant violation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Reserved, active and inactive nodes must be allocated
    #[error("Node {hostname} is {state} but has no allocation")]
    MissingAllocation { hostname: Hostname, state: NodeState },

    /// Nodes in other states must not be allocated
    #[error("Node {hostname} is {state} but is allocated")]
    UnexpectedAllocation { hostname: Hostname, state: NodeState },

    /// A node cannot run on itself
    #[error("Node {hostname} is its own parent")]
    SelfParent { hostname: Hostname },
}

/// Validate that a node is allocated exactly when its state requires it
pub fn validate_allocation(node: &Node) -> ValidationResult {
    let state = node.state();
    match (state.is_allocated(), node.allocation().is_some()) {
        (true, false) => Err(ValidationError::MissingAllocation {
            hostname: node.hostname().clone(),
            state,
        }),
        (false, true) => Err(ValidationError::UnexpectedAllocation {
            hostname: node.hostname().clone(),
            state,
        }),
        _ => Ok(()),
    }
}

/// Validate that a node does not reference itself as parent
pub fn validate_parent_reference(node: &Node) -> ValidationResult {
    if node.parent_hostname() == Some(node.hostname()) {
        return Err(ValidationError::SelfParent {
            hostname: node.hostname().clone(),
        });
    }
    Ok(())
}

/// Validate all node invariants
pub fn validate_node(node: &Node) -> ValidationResult {
    validate_allocation(node)?;
    validate_parent_reference(node)
}

/// Requested hostnames not matched by any candidate node
///
/// Empty when the candidates cover every requested host.
pub fn uncovered_hosts<'a>(
    requested: &BTreeSet<Hostname>,
    candidates: impl IntoIterator<Item = &'a Node>,
) -> BTreeSet<Hostname> {
    let mut missing = requested.clone();
    for node in candidates {
        missing.remove(node.hostname());
    }
    missing
}

/// A guest that cannot be activated because its parent is not active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentViolation {
    pub child: Hostname,
    pub parent: Hostname,
    pub parent_state: NodeState,
}

impl fmt::Display for ParentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Refusing to activate {}: Its parent ({}) is not active (is {}).",
            self.child, self.parent, self.parent_state
        )
    }
}

/// Every candidate whose parent is present in `inventory` but not active
///
/// Candidates without a parent, or whose parent is unknown to the
/// inventory, are not violations.
pub fn unavailable_parents<'a>(
    inventory: impl IntoIterator<Item = &'a Node>,
    candidates: &[Node],
) -> Vec<ParentViolation> {
    let parent_hostnames: HashSet<&Hostname> = candidates
        .iter()
        .filter_map(Node::parent_hostname)
        .collect();

    let parents_by_hostname: HashMap<&Hostname, &Node> = inventory
        .into_iter()
        .filter(|node| parent_hostnames.contains(node.hostname()))
        .map(|node| (node.hostname(), node))
        .collect();

    candidates
        .iter()
        .filter_map(|child| {
            let parent = parents_by_hostname.get(child.parent_hostname()?)?;
            (parent.state() != NodeState::Active).then(|| ParentViolation {
                child: child.hostname().clone(),
                parent: parent.hostname().clone(),
                parent_state: parent.state(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Allocation, ApplicationId, ClusterMembership, ClusterType, Flavor, FlavorEnvironment,
        NodeResources, NodeType,
    };

    fn flavor() -> Flavor {
        Flavor::new("small", NodeResources::new(1.0, 4.0, 20.0), FlavorEnvironment::Container)
    }

    fn hostname(name: &str) -> Hostname {
        Hostname::new(name).unwrap()
    }

    fn host(name: &str, state: NodeState) -> Node {
        let builder = Node::builder(hostname(name), flavor())
            .node_type(NodeType::Host)
            .state(state);
        let builder = if state.is_allocated() {
            builder.allocation(Allocation::new(
                ApplicationId::new("zone", "routing", "default").unwrap(),
                ClusterMembership::new(ClusterType::Admin, "hosts", 0),
            ))
        } else {
            builder
        };
        builder.build().unwrap()
    }

    fn guest(name: &str, parent: Option<&str>) -> Node {
        let builder = Node::builder(hostname(name), flavor());
        match parent {
            Some(parent) => builder.parent(hostname(parent)).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    #[test]
    fn test_validate_allocation() {
        assert!(validate_allocation(&guest("g1", None)).is_ok());
        assert!(validate_allocation(&host("p1", NodeState::Active)).is_ok());
    }

    #[test]
    fn test_uncovered_hosts() {
        let requested: BTreeSet<Hostname> =
            ["g1", "g2", "g9"].iter().map(|h| hostname(h)).collect();
        let candidates = vec![guest("g1", None), guest("g2", None)];

        let missing = uncovered_hosts(&requested, &candidates);
        assert_eq!(missing, BTreeSet::from([hostname("g9")]));

        let covered: BTreeSet<Hostname> = ["g1"].iter().map(|h| hostname(h)).collect();
        assert!(uncovered_hosts(&covered, &candidates).is_empty());
    }

    #[test]
    fn test_unavailable_parents_reports_every_violation() {
        let inventory = vec![
            host("p1", NodeState::Provisioned),
            host("p2", NodeState::Active),
            host("p3", NodeState::Parked),
        ];
        let candidates = vec![
            guest("g1", Some("p1")),
            guest("g2", Some("p2")),
            guest("g3", Some("p3")),
            guest("g4", None),
            guest("g5", Some("unknown-parent")),
        ];

        let violations = unavailable_parents(&inventory, &candidates);
        assert_eq!(
            violations,
            vec![
                ParentViolation {
                    child: hostname("g1"),
                    parent: hostname("p1"),
                    parent_state: NodeState::Provisioned,
                },
                ParentViolation {
                    child: hostname("g3"),
                    parent: hostname("p3"),
                    parent_state: NodeState::Parked,
                },
            ]
        );
    }

    #[test]
    fn test_parent_violation_display() {
        let violation = ParentViolation {
            child: hostname("g1"),
            parent: hostname("p1"),
            parent_state: NodeState::Provisioned,
        };
        assert_eq!(
            violation.to_string(),
            "Refusing to activate g1: Its parent (p1) is not active (is provisioned)."
        );
    }
}
