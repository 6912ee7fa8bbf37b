// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node repository configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::errors::{RepositoryError, RepositoryResult};

/// Node repository configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRepositoryConfig {
    /// Zone this repository serves (log context)
    pub zone: String,

    /// Upper bound on waiting for an application lock; `None` waits indefinitely
    pub lock_timeout: Option<Duration>,
}

impl NodeRepositoryConfig {
    /// Environment variable holding the zone name
    pub const ZONE_ENV: &'static str = "NODE_REPOSITORY_ZONE";

    /// Environment variable holding the lock timeout in milliseconds
    pub const LOCK_TIMEOUT_ENV: &'static str = "NODE_REPOSITORY_LOCK_TIMEOUT_MS";

    /// Create a configuration for `zone` with default settings
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            ..Self::default()
        }
    }

    /// Bound lock waits by `timeout`
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Read configuration from the environment, falling back to defaults
    pub fn from_env() -> RepositoryResult<Self> {
        let mut config = Self::default();
        if let Ok(zone) = env::var(Self::ZONE_ENV) {
            config.zone = zone;
        }
        if let Ok(timeout) = env::var(Self::LOCK_TIMEOUT_ENV) {
            let millis: u64 = timeout.parse().map_err(|_| {
                RepositoryError::Configuration(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    Self::LOCK_TIMEOUT_ENV,
                    timeout
                ))
            })?;
            config.lock_timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }
}

impl Default for NodeRepositoryConfig {
    fn default() -> Self {
        Self {
            zone: "default".to_string(),
            lock_timeout: None,
        }
    }
}
