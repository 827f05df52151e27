//! Boundary traits for the user and skill directories.
//!
//! Both are external collaborators; settlement only needs lookups.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// What the user directory returns about a potential counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartyProfile {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
    pub email_verified: bool,
    pub identity_verified: bool,
}

/// Lookup of marketplace users by id, name or email.
pub trait UserDirectory: Send + Sync {
    fn lookup(&self, id: &UserId) -> Option<CounterpartyProfile>;

    /// Case-insensitive match against name or email.
    fn search(&self, query: &str) -> Vec<CounterpartyProfile>;
}

/// Prefix autocomplete over known skill names.
pub trait SkillDirectory: Send + Sync {
    fn suggest(&self, prefix: &str, limit: usize) -> Vec<String>;
}
