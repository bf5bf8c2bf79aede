//! Cooperative stop signalling for periodic jobs.
//!
//! # Invariants
//! - A stop never preempts a write step; it is only observed at poll points.
//! - `pause` returns early once the token or the extra condition reports a stop.
//! - Rust threads cannot be interrupted; `JobError::InterruptedWait` only
//!   surfaces from a poisoned token mutex and is kept as the non-fatal pause
//!   failure kind.

use crate::job::error::JobError;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Per-job stop token shared between a job and its handle.
#[derive(Debug, Default)]
pub struct StopToken {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token stopped and wakes a pausing job.
    pub fn stop(&self) {
        match self.stopped.lock() {
            Ok(mut stopped) => *stopped = true,
            Err(poisoned) => *poisoned.into_inner() = true,
        }
        self.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        match self.stopped.lock() {
            Ok(stopped) => *stopped,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Wakes a pausing job so it re-evaluates its external stop condition.
    ///
    /// Takes the token mutex first so a wake-up between the predicate check
    /// and the wait cannot be lost.
    pub(crate) fn wake(&self) {
        let _stopped = self.stopped.lock();
        self.wake.notify_all();
    }

    /// Waits up to `interval`, returning early when a stop is observed.
    ///
    /// Returns `JobError::InterruptedWait` when the wait could not be performed
    /// normally; in that case the full interval has still elapsed.
    pub(crate) fn pause<F>(&self, interval: Duration, external_stop: F) -> Result<(), JobError>
    where
        F: Fn() -> bool,
    {
        let guard = match self.stopped.lock() {
            Ok(guard) => guard,
            Err(_) => {
                std::thread::sleep(interval);
                return Err(JobError::InterruptedWait(
                    "stop token mutex poisoned".to_string(),
                ));
            }
        };
        self.wake
            .wait_timeout_while(guard, interval, |stopped| !*stopped && !external_stop())
            .map(|_| ())
            .map_err(|_| JobError::InterruptedWait("stop token mutex poisoned".to_string()))
    }
}
