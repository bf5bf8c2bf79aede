//! Member domain model.
//!
//! # Responsibility
//! - Define the immutable identity+attribute record stored in a group.
//!
//! # Invariants
//! - Equality and hashing use `member_id` only; `age` never takes part.
//! - A member is never mutated after construction.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// One member of a [`crate::Group`].
///
/// Two members with the same id are the same member, whatever their age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    member_id: String,
    age: u32,
}

impl Member {
    pub fn new(member_id: impl Into<String>, age: u32) -> Self {
        Self {
            member_id: member_id.into(),
            age,
        }
    }

    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.member_id == other.member_id
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member_id.hash(state);
    }
}
