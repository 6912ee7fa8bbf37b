// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node History
//!
//! Keeps the most recent time each kind of event happened to a node. Time
//! is always passed in; nothing here reads the clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::NodeState;

/// Kind of event recorded in a node's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEventType {
    Provisioned,
    Reserved,
    Activated,
    Deactivated,
    Retired,
    Deallocated,
    Failed,
    Parked,
    Deprovisioned,
}

impl HistoryEventType {
    /// The event recorded when a node enters `state`
    pub fn for_state(state: NodeState) -> Self {
        match state {
            NodeState::Provisioned => Self::Deallocated,
            NodeState::Reserved => Self::Reserved,
            NodeState::Active => Self::Activated,
            NodeState::Inactive => Self::Deactivated,
            NodeState::Failed => Self::Failed,
            NodeState::Parked => Self::Parked,
            NodeState::Deprovisioned => Self::Deprovisioned,
        }
    }
}

impl fmt::Display for HistoryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Provisioned => "provisioned",
            Self::Reserved => "reserved",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::Retired => "retired",
            Self::Deallocated => "deallocated",
            Self::Failed => "failed",
            Self::Parked => "parked",
            Self::Deprovisioned => "deprovisioned",
        };
        f.write_str(name)
    }
}

/// Latest occurrence of each event type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    events: BTreeMap<HistoryEventType, DateTime<Utc>>,
}

impl History {
    /// History of a node created at `at`
    pub fn provisioned_at(at: DateTime<Utc>) -> Self {
        Self::default().with(HistoryEventType::Provisioned, at)
    }

    /// Returns a copy with `event` recorded at `at`, replacing any earlier occurrence
    pub fn with(&self, event: HistoryEventType, at: DateTime<Utc>) -> Self {
        let mut events = self.events.clone();
        events.insert(event, at);
        Self { events }
    }

    /// When `event` last happened, if ever
    pub fn event(&self, event: HistoryEventType) -> Option<DateTime<Utc>> {
        self.events.get(&event).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HistoryEventType, DateTime<Utc>)> + '_ {
        self.events.iter().map(|(event, at)| (*event, *at))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
