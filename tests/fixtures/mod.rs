// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-node-repository
//!
//! Provides deterministic nodes, applications and repositories for the
//! integration tests. All timestamps are fixed constants and the repository
//! runs on a manual clock, so tests are reproducible.
//!
//! # Design Principles
//! - All test data is deterministic (no `Utc::now()`)
//! - Nodes are seeded through the store, so they pass the same validation as writes
//! - Each test crate uses a subset of these helpers

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, Once};

use cim_node_repository::domain::{
    Allocation, ApplicationId, ClusterMembership, ClusterType, Flavor, FlavorEnvironment, History,
    Hostname, Node, NodeResources, NodeState, NodeType,
};
use cim_node_repository::repository::NodeOperation;
use cim_node_repository::{
    Activator, HostSpec, InMemoryNodeStore, ManualClock, NodeRepository, NodeRepositoryConfig,
    NodeTransaction,
};

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary; filtered by `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn hostname(name: &str) -> Hostname {
    Hostname::new(name).expect("Invalid hostname in test fixture")
}

pub fn hostnames(names: &[&str]) -> BTreeSet<Hostname> {
    names.iter().map(|name| hostname(name)).collect()
}

/// The application under test
pub fn music() -> ApplicationId {
    ApplicationId::with_default_instance("search", "music").expect("Invalid application id")
}

/// An unrelated application sharing the inventory
pub fn books() -> ApplicationId {
    ApplicationId::with_default_instance("search", "books").expect("Invalid application id")
}

/// Owner of allocated hosts
pub fn zone_application() -> ApplicationId {
    ApplicationId::with_default_instance("hosted-vespa", "tenant-host")
        .expect("Invalid application id")
}

pub fn container_flavor() -> Flavor {
    Flavor::new(
        "d-2-8-50",
        NodeResources::new(2.0, 8.0, 50.0),
        FlavorEnvironment::Container,
    )
}

pub fn large_container_flavor() -> Flavor {
    Flavor::new(
        "d-4-16-100",
        NodeResources::new(4.0, 16.0, 100.0),
        FlavorEnvironment::Container,
    )
}

pub fn host_flavor() -> Flavor {
    Flavor::new(
        "host-48-256-2000",
        NodeResources::new(48.0, 256.0, 2000.0),
        FlavorEnvironment::BareMetal,
    )
}

pub fn membership(index: u32) -> ClusterMembership {
    ClusterMembership::new(ClusterType::Container, "default", index)
}

/// A host in `state`, owned by the zone application when allocated
pub fn host(name: &str, state: NodeState) -> Node {
    let builder = Node::builder(hostname(name), host_flavor())
        .node_type(NodeType::Host)
        .state(state)
        .history(History::provisioned_at(fixed_timestamp()));
    let builder = if state.is_allocated() {
        builder.allocation(Allocation::new(
            zone_application(),
            ClusterMembership::new(ClusterType::Admin, "tenant-host", 0),
        ))
    } else {
        builder
    };
    builder.build().expect("Invalid host in test fixture")
}

/// An unallocated tenant node
pub fn provisioned(name: &str, parent: Option<&str>) -> Node {
    Node::create(
        hostname(name),
        parent.map(hostname),
        container_flavor(),
        NodeType::Tenant,
        fixed_timestamp(),
    )
    .expect("Invalid node in test fixture")
}

/// A tenant node allocated to `owner` in `state`
pub fn allocated(
    name: &str,
    parent: Option<&str>,
    state: NodeState,
    owner: &ApplicationId,
    retired: bool,
) -> Node {
    let membership = if retired {
        membership(0).retire()
    } else {
        membership(0)
    };
    provisioned(name, parent)
        .allocate(owner.clone(), membership, fixed_timestamp())
        .with_state(state, fixed_timestamp())
}

pub fn reserved(name: &str, parent: Option<&str>) -> Node {
    allocated(name, parent, NodeState::Reserved, &music(), false)
}

pub fn active(name: &str, parent: Option<&str>) -> Node {
    allocated(name, parent, NodeState::Active, &music(), false)
}

pub fn host_spec(name: &str) -> HostSpec {
    HostSpec::new(hostname(name), membership(0))
}

pub fn host_specs(names: &[&str]) -> Vec<HostSpec> {
    names.iter().map(|name| host_spec(name)).collect()
}

/// Repository over `nodes` on a manual clock at the fixed timestamp
pub fn repository(nodes: Vec<Node>) -> (Arc<NodeRepository>, Arc<ManualClock>) {
    repository_with_config(nodes, NodeRepositoryConfig::new("test"))
}

pub fn repository_with_config(
    nodes: Vec<Node>,
    config: NodeRepositoryConfig,
) -> (Arc<NodeRepository>, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(fixed_timestamp()));
    let store = InMemoryNodeStore::with_nodes(nodes).expect("Invalid inventory in test fixture");
    let repository = NodeRepository::new(Arc::new(store), clock.clone(), config);
    (Arc::new(repository), clock)
}

pub fn activator(nodes: Vec<Node>) -> (Activator, Arc<NodeRepository>) {
    let (repository, _) = repository(nodes);
    (Activator::new(repository.clone()), repository)
}

/// Staged write groups as (target state, hostnames)
pub fn staged_groups(transaction: &NodeTransaction) -> Vec<(NodeState, BTreeSet<Hostname>)> {
    transaction
        .operations()
        .iter()
        .filter_map(|operation| match operation {
            NodeOperation::Write { target, nodes } => Some((
                *target,
                nodes.iter().map(|node| node.hostname().clone()).collect(),
            )),
            _ => None,
        })
        .collect()
}

/// Staged node records, in staging order
pub fn staged_nodes(transaction: &NodeTransaction) -> Vec<Node> {
    transaction
        .operations()
        .iter()
        .flat_map(|operation| operation.nodes().to_vec())
        .collect()
}

pub fn active_hostnames(repository: &NodeRepository, owner: &ApplicationId) -> BTreeSet<Hostname> {
    repository
        .list()
        .owner(owner)
        .state(NodeState::Active)
        .hostnames()
}
