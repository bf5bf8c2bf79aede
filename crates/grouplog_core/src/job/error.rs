//! Job error types.
//!
//! # Invariants
//! - Configuration errors are produced before any target file is touched.
//! - `InterruptedWait` is the only non-fatal kind; the job logs it and keeps going.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type JobResult<T> = Result<T, JobError>;

/// Which of the two destination files an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRole {
    Primary,
    Secondary,
}

impl Display for TargetRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Target path validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingTarget(TargetRole),
    TargetNotFound { role: TargetRole, path: PathBuf },
    TargetNotAFile { role: TargetRole, path: PathBuf },
}

impl ConfigError {
    pub fn role(&self) -> TargetRole {
        match self {
            Self::MissingTarget(role) => *role,
            Self::TargetNotFound { role, .. } | Self::TargetNotAFile { role, .. } => *role,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTarget(role) => write!(f, "{role} target path must be specified"),
            Self::TargetNotFound { role, path } => {
                write!(f, "{role} target `{}` does not exist", path.display())
            }
            Self::TargetNotAFile { role, path } => {
                write!(f, "{role} target `{}` is not a regular file", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Errors raised while starting or running a periodic write job.
#[derive(Debug)]
pub enum JobError {
    Configuration(ConfigError),
    Io { path: PathBuf, source: io::Error },
    InterruptedWait(String),
    Spawn(io::Error),
    Panicked(String),
}

impl JobError {
    /// Returns `false` for errors the job survives.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InterruptedWait(_))
    }
}

impl Display for JobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(err) => write!(f, "invalid job configuration: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write member report to `{}`: {source}", path.display())
            }
            Self::InterruptedWait(detail) => write!(f, "pause between write steps interrupted: {detail}"),
            Self::Spawn(err) => write!(f, "failed to spawn job thread: {err}"),
            Self::Panicked(message) => write!(f, "job thread panicked: {message}"),
        }
    }
}

impl Error for JobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Spawn(err) => Some(err),
            Self::InterruptedWait(_) | Self::Panicked(_) => None,
        }
    }
}

impl From<ConfigError> for JobError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value)
    }
}
