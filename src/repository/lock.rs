// Copyright (c) 2025 - Cowboy AI, Inc.
//! Per-Application Locks
//!
//! Activation decisions for one application are serialized by holding that
//! application's lock across snapshot, validation and staging. Locks of
//! different applications are independent mutexes and never contend.

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

use crate::domain::ApplicationId;

/// Lock acquisition error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("Timed out after {timeout:?} waiting for the lock of {application}")]
    Timeout {
        application: ApplicationId,
        timeout: Duration,
    },
}

/// Registry of application locks
pub struct ApplicationLocks {
    locks: Mutex<HashMap<ApplicationId, Arc<Mutex<()>>>>,
    timeout: Option<Duration>,
}

impl ApplicationLocks {
    /// Create a registry; `timeout` bounds every acquisition, `None` blocks until acquired
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn lock_for(&self, application: &ApplicationId) -> Arc<Mutex<()>> {
        // The registry mutex is held only for the lookup, never while waiting
        let mut locks = self.locks.lock();
        // Only the registry references an idle lock; holders and waiters keep a clone
        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        locks.entry(application.clone()).or_default().clone()
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.locks.lock().len()
    }

    /// Acquire the lock of `application`, waiting at most the configured timeout
    pub fn lock(&self, application: &ApplicationId) -> Result<ApplicationLock, LockError> {
        let mutex = self.lock_for(application);
        let guard = match self.timeout {
            Some(timeout) => mutex
                .try_lock_arc_for(timeout)
                .ok_or_else(|| LockError::Timeout {
                    application: application.clone(),
                    timeout,
                })?,
            None => mutex.lock_arc(),
        };
        debug!(application = %application, "Acquired application lock");
        Ok(ApplicationLock {
            application: application.clone(),
            _guard: guard,
        })
    }

    /// Acquire the lock of `application` only if nobody holds it
    pub fn try_lock(&self, application: &ApplicationId) -> Option<ApplicationLock> {
        let guard = self.lock_for(application).try_lock_arc()?;
        Some(ApplicationLock {
            application: application.clone(),
            _guard: guard,
        })
    }
}

impl fmt::Debug for ApplicationLocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationLocks")
            .field("applications", &self.locks.lock().len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Held lock of one application; released when dropped
#[must_use = "the application lock is released as soon as the guard is dropped"]
pub struct ApplicationLock {
    application: ApplicationId,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl ApplicationLock {
    pub fn application(&self) -> &ApplicationId {
        &self.application
    }
}

impl Drop for ApplicationLock {
    fn drop(&mut self) {
        trace!(application = %self.application, "Released application lock");
    }
}

impl fmt::Debug for ApplicationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationLock")
            .field("application", &self.application)
            .finish()
    }
}
