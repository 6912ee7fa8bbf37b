// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Lifecycle State Machine
//!
//! Mealy machine over [`NodeState`]: the output carries warnings for
//! operators and flags transitions that take a serving node out of service.
//!
//! # Inputs
//!
//! - Reserve: Provisioned | Inactive → Reserved
//! - Activate: Reserved | Active → Active
//! - Deactivate: Active → Inactive
//! - Deallocate: Reserved | Inactive | Failed | Parked → Provisioned
//! - Fail: any but Deprovisioned → Failed
//! - Park: any but Deprovisioned → Parked
//! - Deprovision: Provisioned | Failed | Parked → Deprovisioned
//! - Update: any → same state

use super::{StateMachine, TransitionError, TransitionResult};
use crate::domain::NodeState;

/// Lifecycle command (FSM input)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCommand {
    Reserve,
    Activate,
    Deactivate,
    Deallocate,
    Fail,
    Park,
    Deprovision,
    /// Rewrite in place
    Update,
}

/// Transition output with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutput {
    /// Warnings generated during transition
    pub warnings: Vec<String>,

    /// Whether the transition takes a serving node out of service
    pub is_critical: bool,
}

impl TransitionOutput {
    pub fn ok() -> Self {
        Self {
            warnings: Vec::new(),
            is_critical: false,
        }
    }

    pub fn with_warnings(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            is_critical: false,
        }
    }

    pub fn critical(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            is_critical: true,
        }
    }
}

impl StateMachine for NodeState {
    type Input = NodeCommand;
    type Output = TransitionOutput;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use NodeCommand::*;
        use NodeState::*;

        match (self, input) {
            (state, Update) => Ok((*state, TransitionOutput::ok())),

            (Deprovisioned, _) => Err(TransitionError::InvalidTransition {
                from: Deprovisioned.to_string(),
                to: "any state".to_string(),
            }),

            (Provisioned | Inactive, Reserve) => Ok((Reserved, TransitionOutput::ok())),
            (Reserved | Active, Activate) => Ok((Active, TransitionOutput::ok())),
            (Active, Deactivate) => Ok((Inactive, TransitionOutput::ok())),
            (Reserved | Inactive | Failed | Parked, Deallocate) => {
                Ok((Provisioned, TransitionOutput::ok()))
            }

            (Active, Fail) => Ok((
                Failed,
                TransitionOutput::critical(vec!["Failing an active node".to_string()]),
            )),
            (Active, Park) => Ok((
                Parked,
                TransitionOutput::critical(vec!["Parking an active node".to_string()]),
            )),
            (Reserved | Inactive, Fail) => Ok((
                Failed,
                TransitionOutput::with_warnings(vec![format!(
                    "Failing a {} node drops its allocation",
                    self
                )]),
            )),
            (Reserved | Inactive, Park) => Ok((
                Parked,
                TransitionOutput::with_warnings(vec![format!(
                    "Parking a {} node drops its allocation",
                    self
                )]),
            )),
            (Provisioned | Parked, Fail) => Ok((Failed, TransitionOutput::ok())),
            (Provisioned | Failed, Park) => Ok((Parked, TransitionOutput::ok())),
            (Failed, Fail) | (Parked, Park) => Err(TransitionError::BusinessRuleViolation(
                format!("Node is already {}", self),
            )),

            (Provisioned | Failed | Parked, Deprovision) => {
                Ok((Deprovisioned, TransitionOutput::ok()))
            }

            (from, command) => Err(TransitionError::InvalidTransition {
                from: from.to_string(),
                to: format!("{:?}", command),
            }),
        }
    }

    fn valid_inputs(&self) -> Vec<Self::Input> {
        use NodeCommand::*;

        [Reserve, Activate, Deactivate, Deallocate, Fail, Park, Deprovision, Update]
            .into_iter()
            .filter(|command| self.can_transition(command))
            .collect()
    }
}
