// Copyright (c) 2025 - Cowboy AI, Inc.
//! Allocation and Cluster Membership
//!
//! An allocation records which application owns a node and where in that
//! application's clusters the node serves. Only reserved, active and
//! inactive nodes carry one.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ApplicationId;

/// Kind of cluster a node is a member of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterType {
    Content,
    Container,
    Admin,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Container => "container",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's place in one cluster of an application
///
/// The `retired` flag marks a node that keeps serving while it is drained
/// out of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterMembership {
    cluster_type: ClusterType,
    cluster_id: String,
    group: Option<u32>,
    index: u32,
    retired: bool,
}

impl ClusterMembership {
    pub fn new(cluster_type: ClusterType, cluster_id: impl Into<String>, index: u32) -> Self {
        Self {
            cluster_type,
            cluster_id: cluster_id.into(),
            group: None,
            index,
            retired: false,
        }
    }

    pub fn in_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn group(&self) -> Option<u32> {
        self.group
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn retired(&self) -> bool {
        self.retired
    }

    /// Returns a copy of this membership marked as retired
    pub fn retire(&self) -> Self {
        Self {
            retired: true,
            ..self.clone()
        }
    }

    /// Returns a copy of this membership which is not retired
    pub fn unretire(&self) -> Self {
        Self {
            retired: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for ClusterMembership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_type, self.cluster_id)?;
        if let Some(group) = self.group {
            write!(f, "/{}", group)?;
        }
        write!(f, "/{}", self.index)?;
        if self.retired {
            f.write_str("/retired")?;
        }
        Ok(())
    }
}

/// Ownership claim of an application on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    owner: ApplicationId,
    membership: ClusterMembership,
}

impl Allocation {
    pub fn new(owner: ApplicationId, membership: ClusterMembership) -> Self {
        Self { owner, membership }
    }

    pub fn owner(&self) -> &ApplicationId {
        &self.owner
    }

    pub fn membership(&self) -> &ClusterMembership {
        &self.membership
    }

    /// Returns a copy of this allocation with the given membership
    pub fn with_membership(&self, membership: ClusterMembership) -> Self {
        Self {
            owner: self.owner.clone(),
            membership,
        }
    }

    pub fn retire(&self) -> Self {
        self.with_membership(self.membership.retire())
    }

    pub fn unretire(&self) -> Self {
        self.with_membership(self.membership.unretire())
    }
}
