// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node State

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a node
///
/// Only `Reserved`, `Active` and `Inactive` nodes are allocated to an
/// application. The activation core moves nodes between those three; the
/// rest belong to provisioning and operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Capacity exists but is not allocated
    Provisioned,
    /// Claimed by an application, not yet serving
    Reserved,
    /// Serving an application
    Active,
    /// Recently removed from an application
    Inactive,
    /// Broken and awaiting repair
    Failed,
    /// Taken out of rotation by an operator
    Parked,
    /// Hardware released (terminal)
    Deprovisioned,
}

impl NodeState {
    pub const ALL: [NodeState; 7] = [
        NodeState::Provisioned,
        NodeState::Reserved,
        NodeState::Active,
        NodeState::Inactive,
        NodeState::Failed,
        NodeState::Parked,
        NodeState::Deprovisioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioned => "provisioned",
            Self::Reserved => "reserved",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Parked => "parked",
            Self::Deprovisioned => "deprovisioned",
        }
    }

    /// Whether nodes in this state carry an allocation
    pub fn is_allocated(&self) -> bool {
        matches!(self, Self::Reserved | Self::Active | Self::Inactive)
    }

    /// Whether a stored node in this state may be overwritten by one in `to`
    ///
    /// Every state may be rewritten in place; `Deprovisioned` accepts nothing else.
    pub fn can_transition_to(&self, to: &NodeState) -> bool {
        use NodeState::*;

        if self == to {
            return true;
        }
        matches!(
            (self, to),
            (Provisioned, Reserved | Failed | Parked | Deprovisioned)
                | (Reserved, Active | Provisioned | Failed | Parked)
                | (Active, Inactive | Failed | Parked)
                | (Inactive, Reserved | Provisioned | Failed | Parked)
                | (Failed, Provisioned | Parked | Deprovisioned)
                | (Parked, Provisioned | Failed | Deprovisioned)
        )
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
