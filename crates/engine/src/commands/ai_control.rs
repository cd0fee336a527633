use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use super::support::{self, check_single_target, roster_tokens};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::ClockPort;
use crate::parser::CommandArgs;

const ONE_TARGET: &str = "Change one character at a time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    On,
    Off,
    #[default]
    Toggle,
}

impl AiMode {
    fn apply(&self, currently: bool) -> bool {
        match self {
            AiMode::On => true,
            AiMode::Off => false,
            AiMode::Toggle => !currently,
        }
    }
}

impl FromStr for AiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" | "enable" | "true" => Ok(AiMode::On),
            "off" | "disable" | "false" => Ok(AiMode::Off),
            "toggle" => Ok(AiMode::Toggle),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AiControlEvent {
    target: CharacterRef,
    mode: AiMode,
    was_ai_controlled: bool,
    ai_controlled: bool,
    timestamp: DateTime<Utc>,
}

/// `/ai @character [on|off|toggle]` - GM hands a character to the AI or takes it back.
pub struct AiControlCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
}

impl AiControlCommand {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        let metadata = CommandMetadata::new(
            "ai",
            "Hand a character to the AI or take it back",
            "/ai @character|@self [on|off|toggle]",
            CommandCategory::Admin,
        )
        .aliases(["aicontrol", "auto"])
        .admin_only();
        Self { metadata, clock }
    }

    fn mode(args: &CommandArgs) -> Result<AiMode, String> {
        match args.plain_text.first() {
            Some(word) => word.parse(),
            None => Ok(AiMode::default()),
        }
    }
}

#[async_trait]
impl CommandDefinition for AiControlCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if !ctx.settings.allow_ai_control {
            result.error("AI control is disabled for this session");
        }

        let mode = match Self::mode(args) {
            Ok(mode) => Some(mode),
            Err(word) => {
                result.error(format!("Unknown mode '{}' (on, off, toggle)", word));
                None
            }
        };
        if args.plain_text.len() > 1 {
            result.warn("Only the first word is read as the mode");
        }

        let target = match args.targets.len() {
            0 => {
                result.error("Choose a character: @name or @self");
                None
            }
            1 => check_single_target(args, ctx, &mut result, ONE_TARGET),
            _ => {
                result.error(ONE_TARGET);
                None
            }
        };

        if let (Some(target), Some(mode)) = (target, mode) {
            let next = mode.apply(target.is_ai_controlled);
            if next == target.is_ai_controlled {
                result.warn(format!(
                    "{} is already {}",
                    target.name,
                    if next { "AI controlled" } else { "player controlled" }
                ));
            } else if next && target.is_player_character {
                result.warn(format!(
                    "{} is a player character; their player loses control",
                    target.name
                ));
            }
        }

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let mode = Self::mode(args)
            .map_err(|word| CommandError::Internal(format!("unknown AI mode '{}'", word)))?;
        let reference = args
            .first_target()
            .ok_or_else(|| CommandError::Internal("ai without a target".into()))?;
        let target = support::resolve(ctx, reference)?;

        let was = target.is_ai_controlled;
        let now = mode.apply(was);
        let message = match (was, now) {
            (false, true) => format!("AI control enabled for {}.", target.name),
            (true, false) => format!("AI control disabled for {}.", target.name),
            (_, true) => format!("{} stays under AI control.", target.name),
            (_, false) => format!("{} stays under player control.", target.name),
        };

        let timestamp = self.clock.now();
        let event = AiControlEvent {
            target: target.into(),
            mode,
            was_ai_controlled: was,
            ai_controlled: now,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out: Vec<String> = ["on", "off", "toggle", "@self"].map(String::from).to_vec();
        out.extend(roster_tokens(ctx, false));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{args, clock, table};

    fn ai() -> AiControlCommand {
        AiControlCommand::new(clock())
    }

    #[test]
    fn is_admin_only() {
        assert!(ai().metadata().admin_only);
    }

    #[test]
    fn respects_session_setting() {
        let mut t = table();
        t.ctx.settings.allow_ai_control = false;
        let result = ai().validate(&args(&["@Bob", "on"]), &t.ctx);
        assert_eq!(result.errors, vec!["AI control is disabled for this session"]);
    }

    #[test]
    fn validates_mode_and_target() {
        let t = table();
        assert_eq!(
            ai().validate(&args(&["@Bob", "maybe"]), &t.ctx).errors,
            vec!["Unknown mode 'maybe' (on, off, toggle)"]
        );
        assert_eq!(
            ai().validate(&args(&["on"]), &t.ctx).errors,
            vec!["Choose a character: @name or @self"]
        );
    }

    #[test]
    fn all_counts_as_many_targets() {
        let t = table();
        assert_eq!(
            ai().validate(&args(&["@all", "on"]), &t.ctx).errors,
            vec!["Change one character at a time"]
        );
    }

    #[test]
    fn warns_when_taking_a_player_character() {
        let t = table();
        let result = ai().validate(&args(&["@Bob", "on"]), &t.ctx);
        assert!(result.is_valid());
        assert_eq!(
            result.warnings,
            vec!["Bob is a player character; their player loses control"]
        );

        let noop = ai().validate(&args(&["@Bob", "off"]), &t.ctx);
        assert_eq!(noop.warnings, vec!["Bob is already player controlled"]);
    }

    #[tokio::test]
    async fn toggle_flips_current_state() {
        let t = table();
        let result = ai().execute(&args(&["@self"]), &t.ctx).await.unwrap();
        assert_eq!(result.message, "AI control enabled for Mira.");
        let data = result.data.unwrap();
        assert_eq!(data["wasAiControlled"], false);
        assert_eq!(data["aiControlled"], true);
    }
}
