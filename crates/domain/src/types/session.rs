//! Session-related domain types
//!
//! Types related to user sessions and roles at the table.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Role of a user in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorldRole {
    /// Game master - controls NPCs, the environment, full control
    Gm,
    /// Player - controls a player character
    Player,
    /// Spectator - can view but not interact
    #[default]
    Spectator,
}

impl WorldRole {
    /// Check if this role can issue commands that act on the game
    pub fn can_act(&self) -> bool {
        matches!(self, WorldRole::Gm | WorldRole::Player)
    }

    pub fn is_gm(&self) -> bool {
        matches!(self, WorldRole::Gm)
    }
}

impl std::fmt::Display for WorldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldRole::Gm => write!(f, "GM"),
            WorldRole::Player => write!(f, "Player"),
            WorldRole::Spectator => write!(f, "Spectator"),
        }
    }
}

/// Session bookkeeping as reported by the session collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub name: String,
    #[serde(default)]
    pub round: u32,
}

impl SessionInfo {
    pub fn new(id: SessionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            round: 0,
        }
    }
}
