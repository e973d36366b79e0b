// src/models/reaction.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Id;

/// Discriminates the reactions that share the toggle mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Skull,
}

impl ReactionKind {
    /// Value stored in the `reactions.kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Skull => "skull",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ReactionKind::Like),
            "skull" => Ok(ReactionKind::Skull),
            other => Err(format!("Unknown reaction kind '{}'", other)),
        }
    }
}

/// Represents the 'reactions' table.
/// At most one row exists per (post_id, user_id, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Id,
    pub post_id: Id,
    pub user_id: Id,
    pub kind: ReactionKind,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Result of a toggle: whether the reaction is now set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub active: bool,
}
