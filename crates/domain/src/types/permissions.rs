use serde::{Deserialize, Serialize};

use super::WorldRole;

/// Capability flags granted to the issuing user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    /// Game master / admin
    pub is_gm: bool,
    pub can_control_npcs: bool,
    pub can_edit_environment: bool,
    pub can_use_cheats: bool,
    pub can_debug: bool,
}

impl Permissions {
    /// Everything granted.
    pub fn gm() -> Self {
        Self {
            is_gm: true,
            can_control_npcs: true,
            can_edit_environment: true,
            can_use_cheats: true,
            can_debug: true,
        }
    }

    /// Nothing beyond acting as one's own character.
    pub fn player() -> Self {
        Self::default()
    }

    /// Baseline capabilities for a table role.
    pub fn for_role(role: WorldRole) -> Self {
        match role {
            WorldRole::Gm => Self::gm(),
            WorldRole::Player | WorldRole::Spectator => Self::player(),
        }
    }
}
