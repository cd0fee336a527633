use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{DiceFormula, ExecutionContext};

use super::support::{self, check_targets, dice_flag, join_names, roster_tokens, RollSummary};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

const MIN_SPELL_LEVEL: u8 = 1;
const MAX_SPELL_LEVEL: u8 = 9;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpellEvent {
    caster: Option<CharacterRef>,
    caster_name: String,
    spell: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<u8>,
    ritual: bool,
    targets: Vec<CharacterRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effect: Option<RollSummary>,
    timestamp: DateTime<Utc>,
}

/// `/cast <spell>` - spells with optional level, targets and an effect roll.
///
/// With `--damage` the given dice are rolled; otherwise a leveled spell rolls
/// one d6 per level and a cantrip or utility spell rolls nothing.
pub struct CastCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl CastCommand {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        let metadata = CommandMetadata::new(
            "cast",
            "Cast a spell, optionally at targets",
            "/cast <spell> [@target...|@all] [--level=1-9] [--damage=XdY] [--ritual]",
            CommandCategory::Magic,
        )
        .aliases(["c", "spell"]);
        Self {
            metadata,
            clock,
            random,
        }
    }

    fn effect_formula(args: &CommandArgs) -> Option<DiceFormula> {
        if let Some(formula) = args
            .flag("damage")
            .and_then(|value| DiceFormula::parse(value.as_str()).ok())
        {
            return Some(formula);
        }
        let level = args.flag("level")?.parse::<u8>().ok()?;
        DiceFormula::new(level, 6, 0).ok()
    }
}

#[async_trait]
impl CommandDefinition for CastCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if args.text().trim().is_empty() {
            result.error(format!("Which spell? Usage: {}", self.metadata.syntax));
        }

        if let Some(value) = args.flag("level") {
            match value.parse::<i64>() {
                Ok(level) if (MIN_SPELL_LEVEL as i64..=MAX_SPELL_LEVEL as i64).contains(&level) => {}
                Ok(_) => result.error(format!(
                    "Spell level must be between {} and {}",
                    MIN_SPELL_LEVEL, MAX_SPELL_LEVEL
                )),
                Err(_) => result.error(format!("--level must be a number (got '{}')", value)),
            }
        }

        dice_flag(args, "damage", &mut result);
        check_targets(args, ctx, &mut result);

        if args.is_set("ritual") && ctx.environment.combat_active {
            result.warn("Rituals take minutes to cast and combat is active");
        }
        support::turn_warning(ctx, &mut result);

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let spell = args.text();
        let level = args.flag("level").and_then(|v| v.parse::<u8>().ok());
        let ritual = args.is_set("ritual");
        let targets: Vec<CharacterRef> = support::resolve_all(args, ctx)?
            .into_iter()
            .map(CharacterRef::from)
            .collect();
        let effect = Self::effect_formula(args)
            .map(|formula| support::roll(&formula, self.random.as_ref()));

        let caster_name = ctx.actor_name().to_string();
        let mut message = format!("{} casts {}", caster_name, spell);
        if let Some(level) = level {
            message.push_str(&format!(" (level {})", level));
        }
        if ritual {
            message.push_str(" as a ritual");
        }
        if !targets.is_empty() {
            let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
            message.push_str(&format!(" at {}", join_names(&names)));
        }
        match &effect {
            Some(roll) => message.push_str(&format!(": {}.", roll.breakdown())),
            None => message.push('.'),
        }

        let timestamp = self.clock.now();
        let event = SpellEvent {
            caster: support::actor_ref(ctx),
            caster_name,
            spell,
            level,
            ritual,
            targets,
            effect: effect.as_ref().map(RollSummary::from),
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out: Vec<String> = (MIN_SPELL_LEVEL..=MAX_SPELL_LEVEL)
            .map(|level| format!("--level={}", level))
            .collect();
        out.push("--ritual".to_string());
        out.push("--damage=".to_string());
        out.push("@all".to_string());
        out.extend(roster_tokens(ctx, false));
        out
    }
}
