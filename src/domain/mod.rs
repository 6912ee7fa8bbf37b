// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Repository Domain Models
//!
//! Value objects and the node entity the repository and the activation core
//! operate on. Everything here is an immutable value; "updates" return new
//! values.
//!
//! # Value Objects
//!
//! - [`Hostname`] - DNS-validated node identity (RFC 1123)
//! - [`ApplicationId`] - Owner of allocated nodes
//! - [`Flavor`] - Resource class of a node
//! - [`ClusterMembership`] / [`Allocation`] - Where an allocated node serves
//! - [`History`] - Latest time of each node event
//!
//! # Entities
//!
//! - [`Node`] - One machine slot, with [`NodeState`]
//!
//! # Invariants
//!
//! Pure validation functions live in [`invariants`].

pub mod allocation;
pub mod application_id;
pub mod flavor;
pub mod history;
pub mod hostname;
pub mod invariants;
pub mod node;
pub mod node_state;

pub use allocation::{Allocation, ClusterMembership, ClusterType};
pub use application_id::{ApplicationId, ApplicationIdError};
pub use flavor::{Flavor, FlavorEnvironment, NodeResources, NodeType};
pub use history::{History, HistoryEventType};
pub use hostname::{Hostname, HostnameError};
pub use invariants::{ParentViolation, ValidationError, ValidationResult};
pub use node::{Node, NodeBuilder};
pub use node_state::NodeState;
