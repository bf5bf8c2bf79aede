//! Periodic write jobs.
//!
//! # Responsibility
//! - Append a group's member report to two existing files on a fixed cadence.
//! - Serialize job runs through an explicit write lock domain.
//! - Give callers a handle to observe, stop and await each job.
//!
//! # Invariants
//! - One OS thread per started job; no pooling.
//! - Cancellation is cooperative and polled after each write step.

pub mod error;
pub mod lock;
pub mod periodic;
pub mod settings;
pub mod stop;
