// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application Activation
//!
//! Makes the set of active nodes of an application exactly the set of hosts
//! it asks for:
//!
//! ```text
//! reserved ∩ desired  → active   (updated from their host specs)
//! active   ∩ desired  → active   (updated from their host specs)
//! active   \ desired  → inactive (retirement cleared)
//! ```
//!
//! Everything is decided under the application lock from one snapshot and
//! staged into the caller's transaction. Nothing is staged when validation
//! fails, and nothing is committed here.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::HostSpec;
use crate::domain::invariants::{unavailable_parents, uncovered_hosts};
use crate::domain::{ApplicationId, Hostname, Node, NodeState, ParentViolation};
use crate::errors::join_hostnames;
use crate::repository::{LockError, NodeList, NodeRepository, NodeTransaction};

/// Why an activation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// Some requested hosts are neither reserved nor active for the application
    #[error(
        "Activation of {application} failed. Could not find all requested hosts.\
         \nRequested: {}\nReserved: {}\nActive: {}\nMissing: {}\
         \nThis might happen if the time from reserving host to activation takes longer \
         time than reservation expiry (the hosts will then no longer be reserved)",
        join_hostnames(.requested),
        join_hostnames(.reserved),
        join_hostnames(.active),
        join_hostnames(.missing)
    )]
    CoverageViolation {
        application: ApplicationId,
        requested: BTreeSet<Hostname>,
        reserved: BTreeSet<Hostname>,
        active: BTreeSet<Hostname>,
        missing: BTreeSet<Hostname>,
    },

    /// Nodes to activate run on parents which are not active
    #[error("Activation of {application} failed: {}", join_violations(.violations))]
    ParentHostUnavailable {
        application: ApplicationId,
        violations: Vec<ParentViolation>,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

fn join_violations(violations: &[ParentViolation]) -> String {
    violations
        .iter()
        .map(ParentViolation::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Activates the nodes of applications
#[derive(Debug, Clone)]
pub struct Activator {
    node_repository: Arc<NodeRepository>,
}

impl Activator {
    pub fn new(node_repository: Arc<NodeRepository>) -> Self {
        Self { node_repository }
    }

    pub fn node_repository(&self) -> &NodeRepository {
        &self.node_repository
    }

    /// Stage the writes making `hosts` the active nodes of `application`
    ///
    /// Requires every host to be reserved or active for the application, and
    /// every reserved node's parent, if known, to be active. When several
    /// specs name the same host the first one is used.
    ///
    /// Retired specs mark their node retired at the current clock time. A node
    /// that is already retired keeps its earlier retirement timestamp.
    pub fn activate(
        &self,
        application: &ApplicationId,
        hosts: &[HostSpec],
        transaction: &mut NodeTransaction,
    ) -> Result<(), ActivationError> {
        let _lock = self.node_repository.lock(application)?;

        let desired = desired_by_hostname(hosts);
        let requested: BTreeSet<Hostname> =
            desired.keys().map(|&hostname| hostname.clone()).collect();

        let all_nodes = self.node_repository.list();
        let application_nodes = all_nodes.owner(application);
        let reserved = application_nodes.state(NodeState::Reserved);
        let active = application_nodes.state(NodeState::Active);
        debug!(
            application = %application,
            requested = requested.len(),
            reserved = reserved.len(),
            active = active.len(),
            "Read application nodes"
        );

        let reserved_to_activate = retain_hosts(&requested, &reserved);
        let continued_active = retain_hosts(&requested, &active);

        let missing = uncovered_hosts(
            &requested,
            continued_active.iter().chain(reserved_to_activate.iter()),
        );
        if !missing.is_empty() {
            warn!(
                application = %application,
                missing = %join_hostnames(&missing),
                "Refusing activation: requested hosts are not reserved or active"
            );
            return Err(ActivationError::CoverageViolation {
                application: application.clone(),
                requested,
                reserved: reserved.hostnames(),
                active: active.hostnames(),
                missing,
            });
        }

        let violations = unavailable_parents(&all_nodes, &reserved_to_activate);
        if !violations.is_empty() {
            warn!(
                application = %application,
                violations = violations.len(),
                "Refusing activation: parent hosts are not active"
            );
            return Err(ActivationError::ParentHostUnavailable {
                application: application.clone(),
                violations,
            });
        }

        // Only active nodes can be retired
        let active_to_remove: Vec<Node> = active
            .iter()
            .filter(|node| !requested.contains(node.hostname()))
            .map(Node::unretire)
            .collect();

        let now = self.node_repository.clock().now();
        let continued_active = update_from(&desired, continued_active, now);
        let reserved_to_activate = update_from(&desired, reserved_to_activate, now);

        info!(
            application = %application,
            transaction = %transaction.id(),
            deactivated = active_to_remove.len(),
            continued = continued_active.len(),
            activated = reserved_to_activate.len(),
            "Staged activation"
        );

        self.node_repository.deactivate(active_to_remove, transaction);
        self.node_repository.activate(continued_active, transaction);
        self.node_repository.activate(reserved_to_activate, transaction);
        Ok(())
    }
}

/// Host specs by hostname, first spec wins
fn desired_by_hostname(hosts: &[HostSpec]) -> BTreeMap<&Hostname, &HostSpec> {
    let mut desired = BTreeMap::new();
    for host in hosts {
        desired.entry(host.hostname()).or_insert(host);
    }
    desired
}

fn retain_hosts(hostnames: &BTreeSet<Hostname>, nodes: &NodeList) -> Vec<Node> {
    nodes
        .iter()
        .filter(|node| hostnames.contains(node.hostname()))
        .cloned()
        .collect()
}

/// Apply membership, retirement and flavor of each node's host spec
fn update_from(
    desired: &BTreeMap<&Hostname, &HostSpec>,
    nodes: Vec<Node>,
    now: DateTime<Utc>,
) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match desired.get(node.hostname()) {
            Some(spec) => {
                let node = if spec.membership().retired() {
                    node.retire(now)
                } else {
                    node.unretire()
                };
                let node = node.with_membership(spec.membership().clone());
                match spec.flavor() {
                    Some(flavor) => node.with_flavor(flavor.clone()),
                    None => node,
                }
            }
            None => node,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::NodeRepositoryConfig;
    use crate::domain::{
        ClusterMembership, ClusterType, Flavor, FlavorEnvironment, HistoryEventType,
        NodeResources, NodeType,
    };
    use crate::repository::{InMemoryNodeStore, NodeOperation};
    use chrono::TimeZone;
    use std::time::Duration;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 14, 7, 0, 0).unwrap()
    }

    fn hostname(name: &str) -> Hostname {
        Hostname::new(name).unwrap()
    }

    fn app() -> ApplicationId {
        ApplicationId::with_default_instance("search", "music").unwrap()
    }

    fn flavor(name: &str) -> Flavor {
        Flavor::new(name, NodeResources::new(2.0, 8.0, 50.0), FlavorEnvironment::Container)
    }

    fn membership(index: u32) -> ClusterMembership {
        ClusterMembership::new(ClusterType::Container, "default", index)
    }

    fn node(name: &str, state: NodeState) -> Node {
        let node = Node::create(hostname(name), None, flavor("small"), NodeType::Tenant, at())
            .unwrap()
            .allocate(app(), membership(0), at());
        node.with_state(state, at())
    }

    fn activator(nodes: Vec<Node>, config: NodeRepositoryConfig) -> Activator {
        let repository = NodeRepository::new(
            Arc::new(InMemoryNodeStore::with_nodes(nodes).unwrap()),
            Arc::new(ManualClock::new(at())),
            config,
        );
        Activator::new(Arc::new(repository))
    }

    fn staged(transaction: &NodeTransaction) -> Vec<(NodeState, Vec<Node>)> {
        transaction
            .operations()
            .iter()
            .filter_map(|operation| match operation {
                NodeOperation::Write { target, nodes } => Some((*target, nodes.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_empty_desired_set_deactivates_everything() {
        let activator = activator(
            vec![node("h1", NodeState::Active), node("h2", NodeState::Reserved)],
            NodeRepositoryConfig::default(),
        );
        let mut transaction = NodeTransaction::new();
        activator.activate(&app(), &[], &mut transaction).unwrap();

        let groups = staged(&transaction);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].0, NodeState::Inactive);
        assert_eq!(groups[0].1.len(), 1);
        assert!(groups[1].1.is_empty());
        assert!(groups[2].1.is_empty());
    }

    #[test]
    fn test_first_spec_wins_for_duplicate_hosts() {
        let activator = activator(
            vec![node("h1", NodeState::Reserved)],
            NodeRepositoryConfig::default(),
        );
        let hosts = [
            HostSpec::new(hostname("h1"), membership(3)),
            HostSpec::new(hostname("h1"), membership(7)),
        ];
        let mut transaction = NodeTransaction::new();
        activator.activate(&app(), &hosts, &mut transaction).unwrap();

        let activated = &staged(&transaction)[2].1;
        assert_eq!(activated.len(), 1);
        let index = activated[0].allocation().map(|a| a.membership().index());
        assert_eq!(index, Some(3));
    }

    #[test]
    fn test_retired_spec_records_retirement_and_flavor() {
        let activator = activator(
            vec![node("h1", NodeState::Active)],
            NodeRepositoryConfig::default(),
        );
        let hosts =
            [HostSpec::new(hostname("h1"), membership(0).retire()).with_flavor(flavor("large"))];
        let mut transaction = NodeTransaction::new();
        activator.activate(&app(), &hosts, &mut transaction).unwrap();

        let continued = &staged(&transaction)[1].1;
        assert!(continued[0].is_retired());
        assert_eq!(continued[0].flavor().name(), "large");
        assert_eq!(continued[0].history().event(HistoryEventType::Retired), Some(at()));
    }

    #[test]
    fn test_lock_timeout_stages_nothing() {
        let activator = activator(
            vec![node("h1", NodeState::Reserved)],
            NodeRepositoryConfig::default().with_lock_timeout(Duration::from_millis(10)),
        );
        let _held = activator.node_repository().lock(&app()).unwrap();

        let mut transaction = NodeTransaction::new();
        let result = activator.activate(
            &app(),
            &[HostSpec::new(hostname("h1"), membership(0))],
            &mut transaction,
        );
        assert!(matches!(result, Err(ActivationError::Lock(LockError::Timeout { .. }))));
        assert!(transaction.is_empty());
    }

    #[test]
    fn test_coverage_violation_message() {
        let error = ActivationError::CoverageViolation {
            application: app(),
            requested: BTreeSet::from([hostname("h1"), hostname("h9")]),
            reserved: BTreeSet::from([hostname("h1")]),
            active: BTreeSet::new(),
            missing: BTreeSet::from([hostname("h9")]),
        };
        let message = error.to_string();
        assert!(message.starts_with(
            "Activation of search:music:default failed. Could not find all requested hosts."
        ));
        assert!(message
            .contains("\nRequested: [h1, h9]\nReserved: [h1]\nActive: []\nMissing: [h9]"));
        assert!(message.contains("reservation expiry"));
    }

    #[test]
    fn test_parent_violations_are_joined() {
        let violation = |child: &str, parent: &str| ParentViolation {
            child: hostname(child),
            parent: hostname(parent),
            parent_state: NodeState::Provisioned,
        };
        let error = ActivationError::ParentHostUnavailable {
            application: app(),
            violations: vec![violation("g1", "p1"), violation("g2", "p2")],
        };
        assert_eq!(
            error.to_string(),
            "Activation of search:music:default failed: \
             Refusing to activate g1: Its parent (p1) is not active (is provisioned). \
             Refusing to activate g2: Its parent (p2) is not active (is provisioned)."
        );
    }
}
