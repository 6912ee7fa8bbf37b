// Copyright (c) 2025 - Cowboy AI, Inc.
//! Desired host of an activation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{ClusterMembership, Flavor, Hostname};

/// One host an application wants active, with the membership it should have
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSpec {
    hostname: Hostname,
    membership: ClusterMembership,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    flavor: Option<Flavor>,
}

impl HostSpec {
    pub fn new(hostname: Hostname, membership: ClusterMembership) -> Self {
        Self {
            hostname,
            membership,
            flavor: None,
        }
    }

    /// Replace the node's flavor on activation
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = Some(flavor);
        self
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn membership(&self) -> &ClusterMembership {
        &self.membership
    }

    pub fn flavor(&self) -> Option<&Flavor> {
        self.flavor.as_ref()
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host '{}' ({})", self.hostname, self.membership)
    }
}
