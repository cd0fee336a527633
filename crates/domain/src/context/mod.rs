//! Execution context - the read-only snapshot a command sees.
//!
//! Built fresh per call by the surrounding application from its roster,
//! session and permission providers. Nothing in the interpreter mutates it.

mod environment;

pub use environment::Environment;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::CharacterSnapshot;
use crate::error::DomainError;
use crate::ids::{CharacterId, SessionId, UserId};
use crate::types::{Permissions, SessionInfo, SessionSettings};

/// Target words that refer to the acting character.
pub const SELF_REFERENCES: &[&str] = &["self", "me", "eu"];

/// Returns true when `reference` names the acting character rather than a roster entry.
pub fn is_self_reference(reference: &str) -> bool {
    let reference = reference.trim();
    SELF_REFERENCES
        .iter()
        .any(|word| word.eq_ignore_ascii_case(reference))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub user_id: UserId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_character: Option<CharacterSnapshot>,
    #[serde(default)]
    pub all_characters: Vec<CharacterSnapshot>,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default)]
    pub settings: SessionSettings,
}

impl ExecutionContext {
    pub fn new(user_id: UserId, session_id: SessionId, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            session_id,
            character_id: None,
            timestamp,
            environment: Environment::default(),
            session: None,
            current_character: None,
            all_characters: Vec::new(),
            permissions: Permissions::default(),
            settings: SessionSettings::default(),
        }
    }

    /// Bind the acting character, adding it to the roster when missing.
    pub fn with_character(mut self, character: CharacterSnapshot) -> Self {
        if !self.all_characters.iter().any(|c| c.id == character.id) {
            self.all_characters.push(character.clone());
        }
        self.character_id = Some(character.id);
        self.current_character = Some(character);
        self
    }

    pub fn with_roster<I>(mut self, characters: I) -> Self
    where
        I: IntoIterator<Item = CharacterSnapshot>,
    {
        for character in characters {
            if !self.all_characters.iter().any(|c| c.id == character.id) {
                self.all_characters.push(character);
            }
        }
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_session(mut self, session: SessionInfo) -> Self {
        self.session = Some(session);
        self
    }

    /// Roster entries a command may target under the current settings.
    pub fn targetable_characters(&self) -> impl Iterator<Item = &CharacterSnapshot> {
        let restrict =
            self.settings.restrict_targets_to_scene && !self.environment.participants.is_empty();
        self.all_characters
            .iter()
            .filter(move |c| !restrict || self.environment.is_participant(c.id))
    }

    /// Look up a roster entry by id or case-insensitive name.
    pub fn find_character(&self, reference: &str) -> Option<&CharacterSnapshot> {
        self.targetable_characters()
            .find(|c| c.matches_reference(reference))
    }

    /// Resolve a target reference, honouring self-references.
    pub fn resolve_target(&self, reference: &str) -> Result<&CharacterSnapshot, DomainError> {
        if is_self_reference(reference) {
            return self
                .current_character
                .as_ref()
                .ok_or_else(|| DomainError::not_found("Character", "self"));
        }
        self.find_character(reference)
            .ok_or_else(|| DomainError::not_found("Character", reference))
    }

    /// Name used when narrating what the issuer does.
    pub fn actor_name(&self) -> &str {
        match &self.current_character {
            Some(character) => &character.name,
            None if self.permissions.is_gm => "The GM",
            None => "Someone",
        }
    }

    /// True when turn tracking says somebody else holds the turn.
    pub fn is_out_of_turn(&self) -> bool {
        match (&self.current_character, self.environment.current_turn) {
            (Some(actor), Some(holder)) => actor.id != holder,
            _ => false,
        }
    }

    /// True when a character is known to be outside the current scene.
    pub fn is_off_scene(&self, character: &CharacterSnapshot) -> bool {
        !self.environment.participants.is_empty()
            && !self.environment.is_participant(character.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ExecutionContext {
        ExecutionContext::new(UserId::new(), SessionId::new(), Utc::now())
    }

    #[test]
    fn with_character_binds_and_adds_to_roster() {
        let mira = CharacterSnapshot::new("Mira");
        let ctx = context().with_character(mira.clone());
        assert_eq!(ctx.character_id, Some(mira.id));
        assert_eq!(ctx.all_characters.len(), 1);

        let ctx = ctx.with_roster(vec![mira.clone()]);
        assert_eq!(ctx.all_characters.len(), 1);
    }

    #[test]
    fn resolves_self_references() {
        let mira = CharacterSnapshot::new("Mira");
        let ctx = context().with_character(mira.clone());
        assert_eq!(ctx.resolve_target("self").unwrap().id, mira.id);
        assert_eq!(ctx.resolve_target("EU").unwrap().id, mira.id);

        let err = context().resolve_target("me").unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn scene_restriction_hides_absent_characters() {
        let mira = CharacterSnapshot::new("Mira");
        let bob = CharacterSnapshot::new("Bob");
        let environment = Environment {
            participants: vec![mira.id],
            ..Environment::default()
        };
        let mut ctx = context()
            .with_roster(vec![mira.clone(), bob.clone()])
            .with_environment(environment);

        assert!(ctx.find_character("bob").is_some());
        assert!(ctx.is_off_scene(&bob));

        ctx.settings.restrict_targets_to_scene = true;
        assert!(ctx.find_character("bob").is_none());
        assert!(ctx.find_character("mira").is_some());
    }

    #[test]
    fn out_of_turn_needs_turn_tracking() {
        let mira = CharacterSnapshot::new("Mira");
        let bob = CharacterSnapshot::new("Bob");
        let ctx = context().with_character(mira.clone());
        assert!(!ctx.is_out_of_turn());

        let environment = Environment {
            current_turn: Some(bob.id),
            ..Environment::default()
        };
        assert!(ctx.clone().with_environment(environment).is_out_of_turn());
    }

    #[test]
    fn actor_name_falls_back_for_gm() {
        let ctx = context().with_permissions(Permissions::gm());
        assert_eq!(ctx.actor_name(), "The GM");
        assert_eq!(context().actor_name(), "Someone");
    }

    #[test]
    fn deserializes_from_camel_case_snapshot() {
        let json = r#"{
            "userId": "00000000-0000-0000-0000-000000000001",
            "sessionId": "00000000-0000-0000-0000-000000000002",
            "timestamp": "2025-06-15T10:30:00Z",
            "environment": { "combatActive": true },
            "allCharacters": [
                { "id": "00000000-0000-0000-0000-000000000003", "name": "Bob" }
            ],
            "permissions": { "isGm": true }
        }"#;
        let ctx: ExecutionContext = serde_json::from_str(json).unwrap();
        assert!(ctx.environment.combat_active);
        assert!(ctx.permissions.is_gm);
        assert_eq!(ctx.find_character("bob").map(|c| c.name.as_str()), Some("Bob"));
    }
}
