// Copyright (c) 2025 - Cowboy AI, Inc.
//! Flavor and Node Type Domain Model
//!
//! A flavor is the resource class of a node: how much cpu, memory and disk
//! it offers and what kind of machine provides it. Nodes may change flavor
//! in place (containers are resized without being re-provisioned).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of machine backing a flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlavorEnvironment {
    /// Physical server
    BareMetal,
    /// Virtual machine
    VirtualMachine,
    /// Container on a shared host
    Container,
}

impl FlavorEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BareMetal => "bare_metal",
            Self::VirtualMachine => "virtual_machine",
            Self::Container => "container",
        }
    }

    /// Whether nodes of this environment run on a parent host
    pub fn is_guest(&self) -> bool {
        !matches!(self, Self::BareMetal)
    }
}

impl fmt::Display for FlavorEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resources offered by a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeResources {
    pub vcpu: f64,
    pub memory_gb: f64,
    pub disk_gb: f64,
}

impl NodeResources {
    pub fn new(vcpu: f64, memory_gb: f64, disk_gb: f64) -> Self {
        Self {
            vcpu,
            memory_gb,
            disk_gb,
        }
    }

    /// Whether these resources are at least as large as `other` in every dimension
    pub fn satisfies(&self, other: &NodeResources) -> bool {
        self.vcpu >= other.vcpu
            && self.memory_gb >= other.memory_gb
            && self.disk_gb >= other.disk_gb
    }
}

impl fmt::Display for NodeResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[vcpu: {}, memory: {} Gb, disk: {} Gb]",
            self.vcpu, self.memory_gb, self.disk_gb
        )
    }
}

/// Resource class of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    name: String,
    resources: NodeResources,
    environment: FlavorEnvironment,
}

impl Flavor {
    pub fn new(
        name: impl Into<String>,
        resources: NodeResources,
        environment: FlavorEnvironment,
    ) -> Self {
        Self {
            name: name.into(),
            resources,
            environment,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &NodeResources {
        &self.resources
    }

    pub fn environment(&self) -> FlavorEnvironment {
        self.environment
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.resources, self.environment)
    }
}

/// Role of a node in the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Runs application workloads
    Tenant,
    /// Hosts tenant guests
    Host,
    /// Routing proxy
    Proxy,
    /// Hosts proxy guests
    ProxyHost,
    /// Config server
    Config,
    /// Hosts config server guests
    ConfigHost,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Host => "host",
            Self::Proxy => "proxy",
            Self::ProxyHost => "proxy_host",
            Self::Config => "config",
            Self::ConfigHost => "config_host",
        }
    }

    /// Whether nodes of this type carry guest nodes
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host | Self::ProxyHost | Self::ConfigHost)
    }

    /// The guest type a host of this type carries
    pub fn child_type(&self) -> Option<NodeType> {
        match self {
            Self::Host => Some(Self::Tenant),
            Self::ProxyHost => Some(Self::Proxy),
            Self::ConfigHost => Some(Self::Config),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
