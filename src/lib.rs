//! Node repository and activation core for the Composable Information Machine
//!
//! Keeps the inventory of nodes (hosts, virtual machines and containers) of
//! a zone and moves them through their lifecycle. The centerpiece is the
//! [`Activator`], which makes the set of active nodes of an application
//! exactly the set of hosts it asks for, or refuses without touching
//! anything.
//!
//! # Layers
//!
//! ```text
//! provisioning  Activator, HostProvisioner (async boundary)
//!      ↓
//! repository    NodeRepository, NodeStore, NodeTransaction, ApplicationLocks
//!      ↓
//! domain        Node, NodeState, Allocation, invariants (pure)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cim_node_repository::{
//!     Activator, HostSpec, NodeRepository, NodeRepositoryConfig, NodeTransaction,
//! };
//! use cim_node_repository::domain::ApplicationId;
//! use std::sync::Arc;
//!
//! let repository = Arc::new(NodeRepository::in_memory(NodeRepositoryConfig::new("dev")));
//! let activator = Activator::new(repository.clone());
//! let application = ApplicationId::with_default_instance("search", "music").unwrap();
//!
//! let mut transaction = NodeTransaction::new();
//! let hosts: Vec<HostSpec> = Vec::new();
//! activator.activate(&application, &hosts, &mut transaction).unwrap();
//! repository.commit(transaction).unwrap();
//! ```

pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod provisioning;
pub mod repository;
pub mod state_machine;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::NodeRepositoryConfig;
pub use errors::{RepositoryError, RepositoryResult};
pub use provisioning::{ActivationError, Activator, HostProvisioner, HostSpec, ProvisioningError};
pub use repository::{
    ApplicationLock, InMemoryNodeStore, LockError, NodeList, NodeRepository, NodeStore,
    NodeTransaction,
};
