//! Textual member reports.
//!
//! # Responsibility
//! - Render member sets into the block appended by every write step.
//!
//! # Invariants
//! - Rendering is pure: no I/O, no locking, no logging.

pub mod formatter;
