//! Write lock domains.
//!
//! # Responsibility
//! - Serialize the write phase of periodic jobs.
//! - Make the serialization scope explicit: one process-wide domain shared by
//!   every group, or an isolated domain per group.
//!
//! # Invariants
//! - `WriteLock::global()` always returns a handle to the same domain.
//! - A job holds its lock for its whole run, not per write step.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static GLOBAL_WRITE_LOCK: Lazy<WriteLock> = Lazy::new(WriteLock::isolated);

/// Serialization scope a group's jobs run under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// All jobs in the process share one lock; runs are totally ordered.
    #[default]
    Global,
    /// Jobs of one group are serialized; different groups run in parallel.
    PerGroup,
}

/// Cloneable handle to one mutual-exclusion domain.
#[derive(Debug, Clone)]
pub struct WriteLock {
    domain: Arc<Mutex<()>>,
}

/// Held while a job is inside its write phase.
pub type WriteLockGuard<'a> = MutexGuard<'a, ()>;

impl WriteLock {
    /// Handle to the process-wide domain.
    pub fn global() -> Self {
        GLOBAL_WRITE_LOCK.clone()
    }

    /// Creates a fresh domain not shared with anything else.
    pub fn isolated() -> Self {
        Self {
            domain: Arc::new(Mutex::new(())),
        }
    }

    pub fn for_scope(scope: LockScope) -> Self {
        match scope {
            LockScope::Global => Self::global(),
            LockScope::PerGroup => Self::isolated(),
        }
    }

    /// Blocks until the domain is free.
    ///
    /// A job that panicked while holding the lock leaves no state behind, so
    /// poisoning is ignored.
    pub fn acquire(&self) -> WriteLockGuard<'_> {
        self.domain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `None` when another job currently holds the domain.
    pub fn try_acquire(&self) -> Option<WriteLockGuard<'_>> {
        match self.domain.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }

    pub fn shares_domain_with(&self, other: &WriteLock) -> bool {
        Arc::ptr_eq(&self.domain, &other.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::{LockScope, WriteLock};

    #[test]
    fn global_handles_share_one_domain() {
        assert!(WriteLock::global().shares_domain_with(&WriteLock::global()));
        assert!(WriteLock::for_scope(LockScope::Global).shares_domain_with(&WriteLock::global()));
    }

    #[test]
    fn per_group_handles_are_isolated() {
        let first = WriteLock::for_scope(LockScope::PerGroup);
        let second = WriteLock::for_scope(LockScope::PerGroup);
        assert!(!first.shares_domain_with(&second));
        assert!(!first.shares_domain_with(&WriteLock::global()));
    }

    #[test]
    fn try_acquire_fails_while_held() {
        let lock = WriteLock::isolated();
        let clone = lock.clone();
        let _guard = lock.acquire();
        assert!(clone.try_acquire().is_none());
    }
}
