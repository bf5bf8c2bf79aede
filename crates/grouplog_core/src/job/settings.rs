//! Job cadence and stop-policy settings.
//!
//! # Invariants
//! - Defaults reproduce the documented behavior: one-second cadence and a
//!   sticky group stop flag.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pause between two write steps.
pub const DEFAULT_INTERVAL_MS: u64 = 1_000;

/// Number of write steps used by `Group::start_job_ten_times`.
pub const DEFAULT_BOUNDED_ITERATIONS: u64 = 10;

/// What a fresh job start does with the group stop flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// The flag stays set until `Group::clear_stop` is called.
    #[default]
    Sticky,
    /// Starting a job clears the flag first.
    ResetOnStart,
}

/// Settings applied to every job a group starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub interval_ms: u64,
    pub stop_policy: StopPolicy,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            stop_policy: StopPolicy::default(),
        }
    }
}

impl JobSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
