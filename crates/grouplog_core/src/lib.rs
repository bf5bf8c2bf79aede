//! Core logic for group member logging.
//! Groups own a member set and run background jobs that periodically append
//! the member report to two files.

pub mod job;
pub mod logging;
pub mod model;
pub mod report;

pub use job::error::{ConfigError, JobError, JobResult, TargetRole};
pub use job::lock::{LockScope, WriteLock, WriteLockGuard};
pub use job::periodic::{
    validate_targets, IterationBudget, JobHandle, JobId, JobReport, JobState,
};
pub use job::settings::{JobSettings, StopPolicy};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::group::Group;
pub use model::member::Member;
pub use report::formatter::format_members_report;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
