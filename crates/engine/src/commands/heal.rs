use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{is_self_reference, CharacterSnapshot, DiceFormula, ExecutionContext};

use super::support::{self, check_single_target, roster_tokens, Amount, RollSummary};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

const ONE_TARGET: &str = "Heal one target at a time";

const DEFAULT_HEALING: Amount = Amount::Dice(DiceFormula {
    dice_count: 1,
    die_size: 8,
    modifier: 0,
});

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealEvent {
    healer: Option<CharacterRef>,
    target: CharacterRef,
    amount: i32,
    /// Healing left after the max hit point cap, when hit points are known
    #[serde(skip_serializing_if = "Option::is_none")]
    effective: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    roll: Option<RollSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hit_points_before: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hit_points_after: Option<i32>,
    timestamp: DateTime<Utc>,
}

/// `/heal @target` or `/heal self` - restore hit points.
pub struct HealCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl HealCommand {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        let metadata = CommandMetadata::new(
            "heal",
            "Restore hit points to yourself or another character",
            "/heal @target|self [--amount=N|XdY]",
            CommandCategory::Support,
        )
        .aliases(["h", "cure"]);
        Self {
            metadata,
            clock,
            random,
        }
    }

    /// The single reference to heal: `@target`, or a bare `self` / `eu` word.
    fn reference(args: &CommandArgs) -> Option<&str> {
        args.first_target().or_else(|| {
            args.plain_text
                .first()
                .map(String::as_str)
                .filter(|word| is_self_reference(word))
        })
    }
}

#[async_trait]
impl CommandDefinition for HealCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();

        let target: Option<&CharacterSnapshot> = match (args.targets.len(), Self::reference(args)) {
            (0, None) => {
                result.error("Choose who to heal: @name or self");
                None
            }
            (0, Some(word)) => match ctx.resolve_target(word) {
                Ok(character) => Some(character),
                Err(_) => {
                    result.error("You have no character to heal");
                    None
                }
            },
            (1, _) => check_single_target(args, ctx, &mut result, ONE_TARGET),
            _ => {
                result.error(ONE_TARGET);
                None
            }
        };

        if let Some(value) = args.flag("amount") {
            if let Err(e) = value.parse::<Amount>() {
                result.error(format!("--amount must be a number or dice formula: {}", e));
            }
        }

        if let Some(target) = target {
            if target.hit_points.is_some_and(|hp| hp.missing() == 0) {
                result.warn(format!("{} is already at full health", target.name));
            }
        }

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let reference = Self::reference(args)
            .ok_or_else(|| CommandError::Internal("heal without a target".into()))?;
        let target = support::resolve(ctx, reference)?;

        let amount: Amount = support::flag_or(args, "amount", DEFAULT_HEALING);
        let (rolled, roll) = amount.roll(self.random.as_ref());
        let before = target.hit_points.map(|hp| hp.current);
        let after = target.hit_points.map(|hp| hp.after_healing(rolled));
        let effective = target.hit_points.map(|hp| hp.effective_healing(rolled));

        let healer = ctx.actor_name();
        let subject = if ctx.character_id == Some(target.id) {
            "themselves".to_string()
        } else {
            target.name.clone()
        };
        let mut message = match &roll {
            Some(r) => format!("{} heals {} for {} ({}).", healer, subject, rolled, r.breakdown()),
            None => format!("{} heals {} for {}.", healer, subject, rolled),
        };
        if let (Some(hp), Some(after)) = (target.hit_points, after) {
            message.push_str(&format!(
                " {}: {} -> {} / {}.",
                target.name, hp.current, after, hp.max
            ));
        }

        let timestamp = self.clock.now();
        let event = HealEvent {
            healer: support::actor_ref(ctx),
            target: target.into(),
            amount: rolled,
            effective,
            roll: roll.as_ref().map(RollSummary::from),
            hit_points_before: before,
            hit_points_after: after,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out = vec!["@self".to_string()];
        out.extend(roster_tokens(ctx, false));
        out.extend(["--amount=1d8", "--amount=2d4+2", "--amount=5"].map(String::from));
        out
    }
}
