//! Roster entry as seen by the command interpreter.

use serde::{Deserialize, Serialize};

use crate::ids::CharacterId;
use crate::value_objects::HitPoints;

/// Armor class assumed when the roster does not report one.
pub const DEFAULT_ARMOR_CLASS: i32 = 10;

/// Shortest fragment compared against ids; shorter ones hit almost any uuid.
const MIN_ID_FRAGMENT: usize = 4;

/// Read-only view of a character, provided by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub id: CharacterId,
    /// Display name shown in chat
    pub name: String,
    #[serde(default)]
    pub is_ai_controlled: bool,
    #[serde(default)]
    pub is_player_character: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<HitPoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor_class: Option<i32>,
}

impl CharacterSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            is_ai_controlled: false,
            is_player_character: false,
            hit_points: None,
            armor_class: None,
        }
    }

    pub fn with_id(mut self, id: CharacterId) -> Self {
        self.id = id;
        self
    }

    pub fn player(mut self) -> Self {
        self.is_player_character = true;
        self
    }

    pub fn ai_controlled(mut self, ai: bool) -> Self {
        self.is_ai_controlled = ai;
        self
    }

    pub fn with_hit_points(mut self, hit_points: HitPoints) -> Self {
        self.hit_points = Some(hit_points);
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = Some(armor_class);
        self
    }

    pub fn armor_class_or_default(&self) -> i32 {
        self.armor_class.unwrap_or(DEFAULT_ARMOR_CLASS)
    }

    /// Exact reference: the id string, or the name compared case-insensitively.
    pub fn matches_reference(&self, reference: &str) -> bool {
        let reference = reference.trim();
        self.id.to_string().eq_ignore_ascii_case(reference)
            || self.name.to_lowercase() == reference.to_lowercase()
    }

    /// Loose match used by auto-complete: substring of name, or of the id
    /// once the fragment is long enough.
    pub fn matches_partial(&self, partial: &str) -> bool {
        let partial = partial.trim().to_lowercase();
        self.name.to_lowercase().contains(&partial)
            || (partial.chars().count() >= MIN_ID_FRAGMENT
                && self.id.to_string().contains(&partial))
    }
}
