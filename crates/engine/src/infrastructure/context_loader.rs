//! Loads execution-context snapshots for the host binary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tabletalk_domain::{
    CharacterSnapshot, Environment, ExecutionContext, HitPoints, Permissions, SceneSnapshot,
    SessionId, SessionInfo, UserId,
};

/// Read a JSON snapshot produced by the roster/session collaborators.
pub async fn load_context(path: &Path) -> Result<ExecutionContext> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading context snapshot {}", path.display()))?;
    let context: ExecutionContext = serde_json::from_str(&raw)
        .with_context(|| format!("parsing context snapshot {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        characters = context.all_characters.len(),
        combat_active = context.environment.combat_active,
        "Loaded context snapshot"
    );
    Ok(context)
}

/// A small table used when no snapshot is configured.
pub fn demo_context(now: DateTime<Utc>) -> ExecutionContext {
    let hit_points = |current, max| HitPoints { current, max };

    let mira = CharacterSnapshot::new("Mira")
        .player()
        .with_hit_points(hit_points(18, 24))
        .with_armor_class(14);
    let bob = CharacterSnapshot::new("Bob")
        .player()
        .with_hit_points(hit_points(9, 20))
        .with_armor_class(12);
    let goblin = CharacterSnapshot::new("Goblin Scout")
        .ai_controlled(true)
        .with_hit_points(hit_points(7, 7))
        .with_armor_class(13);

    let scene = SceneSnapshot::new("Crossroads").with_locations(["Old Mill", "Tavern", "Forest Path"]);
    let environment = Environment {
        current_scene: Some(scene),
        participants: vec![mira.id, bob.id, goblin.id],
        turn_order: Some(vec![mira.id, goblin.id, bob.id]),
        combat_active: true,
        current_turn: Some(mira.id),
        ambient_conditions: Some(vec!["dusk".to_string()]),
    };

    let session_id = SessionId::new();
    ExecutionContext::new(UserId::new(), session_id, now)
        .with_session(SessionInfo::new(session_id, "Demo Table"))
        .with_roster(vec![bob, goblin])
        .with_character(mira)
        .with_environment(environment)
        .with_permissions(Permissions::gm())
}
