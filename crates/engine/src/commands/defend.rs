use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{DiceFormula, ExecutionContext};

use super::support::{self, RollSummary};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Dodge,
    Parry,
    Brace,
}

impl Stance {
    const ALL: [Stance; 3] = [Stance::Dodge, Stance::Parry, Stance::Brace];

    fn name(&self) -> &'static str {
        match self {
            Stance::Dodge => "dodge",
            Stance::Parry => "parry",
            Stance::Brace => "brace",
        }
    }

    /// Armor class bonus until the defender's next turn.
    fn armor_bonus(&self) -> i32 {
        match self {
            Stance::Dodge => 2,
            Stance::Parry => 1,
            Stance::Brace => 0,
        }
    }

    /// Dice soaked off the next hit; only bracing absorbs damage.
    fn reduction(&self) -> Option<DiceFormula> {
        match self {
            Stance::Brace => Some(DiceFormula {
                dice_count: 1,
                die_size: 6,
                modifier: 0,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stance::ALL
            .into_iter()
            .find(|stance| stance.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefendEvent {
    defender: CharacterRef,
    stance: Stance,
    armor_class_before: i32,
    armor_class_after: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    damage_reduction: Option<RollSummary>,
    timestamp: DateTime<Utc>,
}

/// `/defend` - brace for incoming attacks until the next turn.
pub struct DefendCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl DefendCommand {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        let metadata = CommandMetadata::new(
            "defend",
            "Take a defensive stance until your next turn",
            "/defend [--stance=dodge|parry|brace]",
            CommandCategory::Combat,
        )
        .aliases(["def", "block", "dodge"])
        .requires_target()
        .requires_combat();
        Self {
            metadata,
            clock,
            random,
        }
    }
}

#[async_trait]
impl CommandDefinition for DefendCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if let Some(value) = args.flag("stance") {
            if value.parse::<Stance>().is_err() {
                result.error(format!(
                    "Unknown stance '{}' (dodge, parry, brace)",
                    value
                ));
            }
        }
        if !args.targets.is_empty() {
            result.warn("Defend ignores targets; it always protects you");
        }
        support::turn_warning(ctx, &mut result);
        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let defender = support::actor(ctx)?;
        let stance: Stance = support::flag_or(args, "stance", Stance::default());

        let before = defender.armor_class_or_default();
        let after = before.saturating_add(stance.armor_bonus());
        let reduction = stance
            .reduction()
            .map(|formula| support::roll(&formula, self.random.as_ref()));

        let message = match &reduction {
            Some(soak) => format!(
                "{} braces, ready to absorb {} damage from the next hit.",
                defender.name, soak.total
            ),
            None => format!(
                "{} takes a {} stance (AC {} -> {} until their next turn).",
                defender.name, stance, before, after
            ),
        };

        let timestamp = self.clock.now();
        let event = DefendEvent {
            defender: defender.into(),
            stance,
            armor_class_before: before,
            armor_class_after: after,
            damage_reduction: reduction.as_ref().map(RollSummary::from),
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, _ctx: &ExecutionContext) -> Vec<String> {
        Stance::ALL
            .iter()
            .map(|stance| format!("--stance={}", stance))
            .collect()
    }
}
