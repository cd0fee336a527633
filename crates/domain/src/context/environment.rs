use serde::{Deserialize, Serialize};

use crate::entities::SceneSnapshot;
use crate::ids::CharacterId;

/// Scene and combat state at the moment a command is issued.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Environment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_scene: Option<SceneSnapshot>,
    /// Characters present in the current scene
    pub participants: Vec<CharacterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_order: Option<Vec<CharacterId>>,
    pub combat_active: bool,
    /// Holder of the current turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_turn: Option<CharacterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_conditions: Option<Vec<String>>,
}

impl Environment {
    pub fn in_combat() -> Self {
        Self {
            combat_active: true,
            ..Self::default()
        }
    }

    pub fn is_participant(&self, id: CharacterId) -> bool {
        self.participants.contains(&id)
    }

    /// Position of a character in the turn order, if turns are tracked.
    pub fn turn_position(&self, id: CharacterId) -> Option<usize> {
        self.turn_order
            .as_ref()
            .and_then(|order| order.iter().position(|c| *c == id))
    }

    pub fn known_locations(&self) -> &[String] {
        self.current_scene
            .as_ref()
            .map(|scene| scene.known_locations.as_slice())
            .unwrap_or(&[])
    }
}
