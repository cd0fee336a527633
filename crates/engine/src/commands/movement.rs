use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use super::support::{self, check_targets, join_names, roster_tokens};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::ClockPort;
use crate::parser::CommandArgs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveEvent {
    movers: Vec<CharacterRef>,
    destination: String,
    known_location: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_scene: Option<String>,
    dash: bool,
    timestamp: DateTime<Utc>,
}

/// `/move <destination>` - move yourself, or (GM) other characters.
pub struct MoveCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
}

impl MoveCommand {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        let metadata = CommandMetadata::new(
            "move",
            "Move your character to a location",
            "/move <destination> [@character...] [--dash]",
            CommandCategory::Movement,
        )
        .aliases(["mv", "go", "walk"]);
        Self { metadata, clock }
    }
}

#[async_trait]
impl CommandDefinition for MoveCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let destination = args.text();

        if destination.trim().is_empty() {
            result.error(format!("Where to? Usage: {}", self.metadata.syntax));
        }

        let movers = check_targets(args, ctx, &mut result);
        let moves_others = movers.iter().any(|c| ctx.character_id != Some(c.id));
        if moves_others && !(ctx.permissions.is_gm || ctx.permissions.can_control_npcs) {
            result.error("Only the GM can move other characters");
        }
        if args.targets.is_empty() && ctx.current_character.is_none() {
            result.error("You have no character to move");
        }

        if let Some(scene) = &ctx.environment.current_scene {
            if !destination.is_empty()
                && !scene.known_locations.is_empty()
                && scene.find_location(&destination).is_none()
            {
                result.warn(format!(
                    "'{}' is not a known location from {}",
                    destination, scene.name
                ));
            }
        }
        if ctx.environment.combat_active {
            result.warn("Moving during combat may provoke opportunity attacks");
        }

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let movers: Vec<CharacterRef> = if args.targets.is_empty() {
            vec![support::actor(ctx)?.into()]
        } else {
            support::resolve_all(args, ctx)?
                .into_iter()
                .map(CharacterRef::from)
                .collect()
        };

        let typed = args.text();
        let scene = ctx.environment.current_scene.as_ref();
        let canonical = scene.and_then(|s| s.find_location(&typed));
        let destination = canonical.map(str::to_string).unwrap_or(typed);
        let dash = args.is_set("dash");

        let names: Vec<&str> = movers.iter().map(|m| m.name.as_str()).collect();
        let verb = match (dash, names.len()) {
            (true, 1) => "dashes",
            (true, _) => "dash",
            (false, 1) => "moves",
            (false, _) => "move",
        };
        let message = format!("{} {} to {}.", join_names(&names), verb, destination);

        let timestamp = self.clock.now();
        let event = MoveEvent {
            movers,
            destination,
            known_location: canonical.is_some(),
            from_scene: scene.map(|s| s.name.clone()),
            dash,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out: Vec<String> = ctx.environment.known_locations().to_vec();
        out.push("--dash".to_string());
        if ctx.permissions.is_gm || ctx.permissions.can_control_npcs {
            out.extend(roster_tokens(ctx, true));
        }
        out
    }
}
