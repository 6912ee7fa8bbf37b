//! Error types for node repository operations

use thiserror::Error;

use crate::domain::{ApplicationId, Hostname, NodeState, ValidationError};
use crate::repository::LockError;
use crate::state_machine::TransitionError;

/// Errors raised by the node repository and its store
///
/// A failed commit leaves the store exactly as it was.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No node with this hostname in the inventory
    #[error("No node with hostname {0}")]
    UnknownNode(Hostname),

    /// Hostnames are unique in the inventory
    #[error("A node with hostname {0} already exists")]
    DuplicateHostname(Hostname),

    /// The stored node cannot move to the written state
    #[error("Cannot move {hostname} from {from} to {to}")]
    IllegalTransition {
        hostname: Hostname,
        from: NodeState,
        to: NodeState,
    },

    /// The node is still allocated to another application
    #[error("Cannot write {hostname} as owned by {requested}: it is {state} and owned by {owner}")]
    OwnershipConflict {
        hostname: Hostname,
        owner: ApplicationId,
        requested: ApplicationId,
        state: NodeState,
    },

    /// Removing the node would leave children pointing at nothing
    #[error("Cannot remove {hostname}: it still has children {}", join_hostnames(.children))]
    HasChildren {
        hostname: Hostname,
        children: Vec<Hostname>,
    },

    /// A staged node is not in the state of its write group
    #[error("Node {hostname} is staged in a write to {expected} but is {actual}")]
    StateMismatch {
        hostname: Hostname,
        expected: NodeState,
        actual: NodeState,
    },

    /// The node cannot be used for the requested operation
    #[error("Node {hostname} is not available: {reason}")]
    NotAvailable { hostname: Hostname, reason: String },

    /// A written node violates node invariants
    #[error(transparent)]
    InvalidNode(#[from] ValidationError),

    /// The lifecycle state machine refused a command
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The application lock could not be taken
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for node repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub(crate) fn join_hostnames<'a>(hostnames: impl IntoIterator<Item = &'a Hostname>) -> String {
    let names: Vec<&str> = hostnames.into_iter().map(Hostname::as_str).collect();
    format!("[{}]", names.join(", "))
}
