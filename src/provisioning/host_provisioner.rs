// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Provisioner Boundary
//!
//! Provisioning physical hosts is slow external I/O, so the boundary is an
//! async trait. The functions in this module drive a provisioner and keep
//! the node repository in step with what it reports.
//!
//! # Flow
//!
//! ```text
//! provision_hosts → add_hosts → (provisioned host + child records)
//!                                        ↓
//!                                 reconcile_host ── changed records → write
//!                                        │
//!                                        └─ fatal failure → remove host and children
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::{Flavor, Hostname, Node, NodeType, ValidationError};
use crate::errors::RepositoryError;
use crate::repository::{NodeRepository, NodeTransaction};

/// Provisioning result type
pub type ProvisionResult<T> = Result<T, ProvisioningError>;

/// Provisioning errors
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Provisioning cannot succeed; the host and its children must be deleted
    #[error("Provisioning of {hostname} failed irrecoverably: {reason}")]
    Fatal { hostname: Hostname, reason: String },

    /// Provisioning did not complete and may be retried
    #[error("Provisioning of {hostname} failed: {reason}")]
    Transient { hostname: Hostname, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A host scheduled for provisioning together with the node that will run on it
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionedHost {
    id: String,
    host_hostname: Hostname,
    host_flavor: Flavor,
    node_hostname: Hostname,
    node_flavor: Flavor,
}

impl ProvisionedHost {
    pub fn new(
        id: impl Into<String>,
        host_hostname: Hostname,
        host_flavor: Flavor,
        node_hostname: Hostname,
        node_flavor: Flavor,
    ) -> Self {
        Self {
            id: id.into(),
            host_hostname,
            host_flavor,
            node_hostname,
            node_flavor,
        }
    }

    /// Provider-side identifier of the host
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host_hostname(&self) -> &Hostname {
        &self.host_hostname
    }

    pub fn host_flavor(&self) -> &Flavor {
        &self.host_flavor
    }

    pub fn node_hostname(&self) -> &Hostname {
        &self.node_hostname
    }

    pub fn node_flavor(&self) -> &Flavor {
        &self.node_flavor
    }

    /// Provisioned record of the host
    pub fn host_node(&self, at: DateTime<Utc>) -> Result<Node, ValidationError> {
        Node::create(
            self.host_hostname.clone(),
            None,
            self.host_flavor.clone(),
            NodeType::Host,
            at,
        )
    }

    /// Provisioned record of the node running on the host
    pub fn child_node(&self, at: DateTime<Utc>) -> Result<Node, ValidationError> {
        Node::create(
            self.node_hostname.clone(),
            Some(self.host_hostname.clone()),
            self.node_flavor.clone(),
            NodeType::Tenant,
            at,
        )
    }
}

/// Service provisioning physical tenant hosts in the zone
#[async_trait]
pub trait HostProvisioner: Send + Sync {
    /// Schedule provisioning of one host per index
    ///
    /// Each host is at least as big as `node_flavor`.
    async fn provision_hosts(
        &self,
        provision_indexes: &[u32],
        node_flavor: &Flavor,
    ) -> ProvisionResult<Vec<ProvisionedHost>>;

    /// Continue provisioning `host`
    ///
    /// Returns the subset of `host` and `children` that changed and must be
    /// written back, or [`ProvisioningError::Fatal`] when the records must be
    /// deleted.
    async fn provision(&self, host: &Node, children: &[Node]) -> ProvisionResult<Vec<Node>>;

    /// Release the hardware of `host`
    ///
    /// Does not check that this is safe and does not touch repository records.
    async fn deprovision(&self, host: &Node) -> ProvisionResult<()>;
}

/// Provision one host per index and add their records to the repository
pub async fn add_hosts(
    repository: &NodeRepository,
    provisioner: &dyn HostProvisioner,
    provision_indexes: &[u32],
    node_flavor: &Flavor,
) -> ProvisionResult<Vec<Node>> {
    let hosts = provisioner
        .provision_hosts(provision_indexes, node_flavor)
        .await?;
    let nodes = repository.add_provisioned_hosts(&hosts)?;
    info!(
        zone = %repository.config().zone,
        hosts = hosts.len(),
        flavor = %node_flavor.name(),
        "Scheduled host provisioning"
    );
    Ok(nodes)
}

/// Drive provisioning of `host` one step
///
/// Changed records are written back. On a fatal failure the host and its
/// children are removed in one transaction and the failure is returned,
/// whether or not the removal commits.
pub async fn reconcile_host(
    repository: &NodeRepository,
    provisioner: &dyn HostProvisioner,
    host: &Node,
) -> ProvisionResult<Vec<Node>> {
    let children = repository.list().children_of(host.hostname()).to_vec();

    match provisioner.provision(host, &children).await {
        Ok(changed) => {
            if !changed.is_empty() {
                repository.write(changed.clone())?;
            }
            debug!(hostname = %host.hostname(), changed = changed.len(), "Reconciled host");
            Ok(changed)
        }
        Err(failure @ ProvisioningError::Fatal { .. }) => {
            // The inventory may have changed while provisioning was in flight
            let current = repository.list();
            if current.node(host.hostname()).is_none() {
                warn!(hostname = %host.hostname(), error = %failure, "Host already removed");
                return Err(failure);
            }
            let mut hostnames: Vec<Hostname> = current
                .children_of(host.hostname())
                .iter()
                .map(|child| child.hostname().clone())
                .collect();
            hostnames.push(host.hostname().clone());

            error!(
                zone = %repository.config().zone,
                hostname = %host.hostname(),
                children = hostnames.len() - 1,
                error = %failure,
                "Removing host and its children after fatal provisioning failure"
            );
            let mut transaction = NodeTransaction::new();
            transaction.remove(hostnames);
            if let Err(removal) = repository.commit(transaction) {
                error!(
                    hostname = %host.hostname(),
                    error = %removal,
                    "Failed to remove host after fatal provisioning failure"
                );
            }
            Err(failure)
        }
        Err(failure) => Err(failure),
    }
}

/// Reconcile several hosts concurrently
pub async fn reconcile_hosts(
    repository: &NodeRepository,
    provisioner: &dyn HostProvisioner,
    hosts: &[Node],
) -> Vec<ProvisionResult<Vec<Node>>> {
    join_all(
        hosts
            .iter()
            .map(|host| reconcile_host(repository, provisioner, host)),
    )
    .await
}

/// Release the hardware of a childless host and mark it deprovisioned
pub async fn deprovision_host(
    repository: &NodeRepository,
    provisioner: &dyn HostProvisioner,
    hostname: &Hostname,
) -> ProvisionResult<Node> {
    let snapshot = repository.list();
    let host = snapshot
        .node(hostname)
        .ok_or_else(|| RepositoryError::UnknownNode(hostname.clone()))?;

    let children = snapshot.children_of(hostname);
    if !children.is_empty() {
        return Err(RepositoryError::HasChildren {
            hostname: hostname.clone(),
            children: children.hostnames().into_iter().collect(),
        }
        .into());
    }

    provisioner.deprovision(host).await?;
    Ok(repository.deprovision(hostname)?)
}
