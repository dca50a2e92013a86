//! Family model
//!
//! A family is the unit of ownership: budgets, categories, payment types and
//! recurring rules all belong to exactly one family.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{FamilyId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Family {
    pub id: FamilyId,

    /// Unique family name
    pub name: String,

    /// Users allowed to act on this family's data
    #[serde(default)]
    pub members: Vec<UserId>,

    pub created_at: DateTime<Utc>,
}

impl Family {
    /// Create a family whose first member is `creator`
    pub fn new(name: impl Into<String>, creator: UserId) -> Self {
        Self {
            id: FamilyId::new(),
            name: name.into(),
            members: vec![creator],
            created_at: Utc::now(),
        }
    }

    pub fn has_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    /// Add a member; returns false if already present
    pub fn add_member(&mut self, user: UserId) -> bool {
        if self.has_member(&user) {
            return false;
        }
        self.members.push(user);
        true
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
