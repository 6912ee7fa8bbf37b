// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application Identity
//!
//! An application is the unit of node ownership. Its identity is the triple
//! `tenant:application:instance`, treated as opaque everywhere except here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Application id parse/validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationIdError {
    #[error("Application id part '{part}' is empty")]
    EmptyPart { part: &'static str },

    #[error("Application id part '{part}' contains ':': {value}")]
    InvalidPart { part: &'static str, value: String },

    #[error("Expected 'tenant:application:instance', got '{0}'")]
    Malformed(String),
}

/// Identifies the application that owns a set of nodes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
    tenant: String,
    application: String,
    instance: String,
}

impl ApplicationId {
    /// Instance name used when none is given
    pub const DEFAULT_INSTANCE: &'static str = "default";

    /// Create an application id with validation
    pub fn new(
        tenant: impl Into<String>,
        application: impl Into<String>,
        instance: impl Into<String>,
    ) -> Result<Self, ApplicationIdError> {
        Ok(Self {
            tenant: Self::validate_part("tenant", tenant.into())?,
            application: Self::validate_part("application", application.into())?,
            instance: Self::validate_part("instance", instance.into())?,
        })
    }

    /// Create an application id for the default instance
    pub fn with_default_instance(
        tenant: impl Into<String>,
        application: impl Into<String>,
    ) -> Result<Self, ApplicationIdError> {
        Self::new(tenant, application, Self::DEFAULT_INSTANCE)
    }

    fn validate_part(part: &'static str, value: String) -> Result<String, ApplicationIdError> {
        if value.is_empty() {
            return Err(ApplicationIdError::EmptyPart { part });
        }
        if value.contains(':') {
            return Err(ApplicationIdError::InvalidPart { part, value });
        }
        Ok(value)
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.tenant, self.application, self.instance)
    }
}

impl FromStr for ApplicationId {
    type Err = ApplicationIdError;

    /// Parses `tenant:application:instance`, or `tenant:application` for the default instance
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [tenant, application] => Self::with_default_instance(*tenant, *application),
            [tenant, application, instance] => Self::new(*tenant, *application, *instance),
            _ => Err(ApplicationIdError::Malformed(s.to_string())),
        }
    }
}
