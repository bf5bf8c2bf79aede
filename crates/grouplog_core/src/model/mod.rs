//! Group domain model.
//!
//! # Responsibility
//! - Define the member record and the group that owns a member set.
//! - Expose job-control entry points on the group.
//!
//! # Invariants
//! - A group never holds two members with the same `member_id`.
//! - Readers always observe a consistent snapshot of the member set.

pub mod group;
pub mod member;
