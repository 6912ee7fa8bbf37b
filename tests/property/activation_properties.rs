// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Activation
//!
//! Generates inventories where each node is reserved, active, retired,
//! free or owned by another application, and desired host sets drawn from
//! them (plus hosts that do not exist). Activation must either make the
//! active set exactly the desired set, or refuse and stage nothing.

use proptest::prelude::*;
use std::collections::BTreeSet;

use cim_node_repository::domain::{Hostname, Node, NodeState};
use cim_node_repository::state_machine::StateInvariant;
use cim_node_repository::{ActivationError, NodeTransaction};

use crate::fixtures::*;

// ============================================================================
// Inventory Strategies
// ============================================================================

/// Where a generated node stands relative to the application under test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Reserved,
    Active,
    RetiredActive,
    Free,
    OtherOwner,
}

impl Slot {
    fn node(self, name: &str, parent: Option<&str>) -> Node {
        match self {
            Slot::Reserved => reserved(name, parent),
            Slot::Active => active(name, parent),
            Slot::RetiredActive => allocated(name, parent, NodeState::Active, &music(), true),
            Slot::Free => provisioned(name, parent),
            Slot::OtherOwner => allocated(name, parent, NodeState::Active, &books(), false),
        }
    }

    fn coverable(self) -> bool {
        matches!(self, Slot::Reserved | Slot::Active | Slot::RetiredActive)
    }
}

fn slot() -> impl Strategy<Value = Slot> {
    prop_oneof![
        Just(Slot::Reserved),
        Just(Slot::Active),
        Just(Slot::RetiredActive),
        Just(Slot::Free),
        Just(Slot::OtherOwner),
    ]
}

/// Nodes with a flag telling whether each one is desired
fn inventory() -> impl Strategy<Value = Vec<(Slot, bool)>> {
    prop::collection::vec((slot(), any::<bool>()), 0..12)
}

fn parent_state() -> impl Strategy<Value = NodeState> {
    prop_oneof![
        3 => Just(NodeState::Active),
        1 => Just(NodeState::Provisioned),
        1 => Just(NodeState::Parked),
        1 => Just(NodeState::Failed),
    ]
}

fn name(index: usize) -> String {
    format!("n{}", index)
}

fn desired_names(generated: &[(Slot, bool)], with_unknown_host: bool) -> Vec<String> {
    let mut names: Vec<String> = generated
        .iter()
        .enumerate()
        .filter(|(_, (_, desired))| *desired)
        .map(|(index, _)| name(index))
        .collect();
    if with_unknown_host {
        names.push("unknown".to_string());
    }
    names
}

fn specs(names: &[String]) -> Vec<cim_node_repository::HostSpec> {
    names.iter().map(|name| host_spec(name)).collect()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Exact coverage
    ///
    /// When every desired host is reserved or active for the application,
    /// the committed active set equals the desired set. Otherwise the
    /// activation fails with a coverage violation and stages nothing.
    #[test]
    fn prop_active_set_equals_desired_set(
        generated in inventory(),
        with_unknown_host in any::<bool>(),
    ) {
        let nodes: Vec<Node> = generated
            .iter()
            .enumerate()
            .map(|(index, (slot, _))| slot.node(&name(index), None))
            .collect();
        let (activator, repository) = activator(nodes);
        let before = repository.list();

        let names = desired_names(&generated, with_unknown_host);
        let covered = !with_unknown_host
            && generated.iter().all(|(slot, desired)| !desired || slot.coverable());

        let mut transaction = NodeTransaction::new();
        let result = activator.activate(&music(), &specs(&names), &mut transaction);

        if covered {
            prop_assert!(result.is_ok(), "Covered activation failed: {:?}", result);
            prop_assert_eq!(transaction.len(), 3);
            repository.commit(transaction).map_err(|e| TestCaseError::fail(e.to_string()))?;

            let expected: BTreeSet<Hostname> = names.iter().map(|n| hostname(n)).collect();
            prop_assert_eq!(active_hostnames(&repository, &music()), expected);
        } else {
            let is_coverage_violation =
                matches!(result, Err(ActivationError::CoverageViolation { .. }));
            prop_assert!(is_coverage_violation, "Expected a coverage violation: {:?}", result);
            prop_assert!(transaction.is_empty());
            let after = repository.list();
            prop_assert_eq!(after.as_slice(), before.as_slice());
        }
    }

    /// Property: All-or-nothing on unavailable parents
    ///
    /// Activation succeeds exactly when every reserved node's parent is
    /// active, and a refusal names every offending node.
    #[test]
    fn prop_parent_check_is_all_or_nothing(
        parent_states in prop::collection::vec(parent_state(), 1..4),
        children in 1usize..10,
    ) {
        let mut nodes: Vec<Node> = parent_states
            .iter()
            .enumerate()
            .map(|(index, state)| host(&format!("p{}", index), *state))
            .collect();
        let mut names = Vec::new();
        let mut expected_violations = 0;
        for index in 0..children {
            let parent_index = index % parent_states.len();
            let parent = format!("p{}", parent_index);
            nodes.push(reserved(&name(index), Some(&parent)));
            names.push(name(index));
            if parent_states[parent_index] != NodeState::Active {
                expected_violations += 1;
            }
        }
        let (activator, _) = activator(nodes);

        let mut transaction = NodeTransaction::new();
        let result = activator.activate(&music(), &specs(&names), &mut transaction);

        match result {
            Ok(()) => {
                prop_assert_eq!(expected_violations, 0);
                prop_assert_eq!(staged_groups(&transaction)[2].1.len(), children);
            }
            Err(ActivationError::ParentHostUnavailable { violations, .. }) => {
                prop_assert_eq!(violations.len(), expected_violations);
                prop_assert!(transaction.is_empty());
            }
            Err(other) => prop_assert!(false, "Unexpected error: {}", other),
        }
    }

    /// Property: Staged writes are valid node records
    ///
    /// Every staged node satisfies the node invariants, is owned by the
    /// application, and deactivated nodes are never retired.
    #[test]
    fn prop_staged_nodes_are_valid(generated in inventory()) {
        let nodes: Vec<Node> = generated
            .iter()
            .enumerate()
            .map(|(index, (slot, _))| slot.node(&name(index), None))
            .collect();
        let (activator, _) = activator(nodes);

        // Desire only what can be covered
        let names: Vec<String> = generated
            .iter()
            .enumerate()
            .filter(|(_, (slot, desired))| *desired && slot.coverable())
            .map(|(index, _)| name(index))
            .collect();

        let mut transaction = NodeTransaction::new();
        let result = activator.activate(&music(), &specs(&names), &mut transaction);
        prop_assert!(result.is_ok(), "Activation failed: {:?}", result);

        for node in staged_nodes(&transaction) {
            prop_assert!(node.check_invariants().is_ok());
            prop_assert!(node.is_owned_by(&music()));
            if node.state() == NodeState::Inactive {
                prop_assert!(!node.is_retired());
            }
        }
    }
}
