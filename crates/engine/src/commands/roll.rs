use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{DiceFormula, DiceParseError, DiceRollResult, ExecutionContext};

use super::support;
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RollEvent {
    roller: Option<CharacterRef>,
    roller_name: String,
    formula: String,
    result: DiceRollResult,
    total: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    private: bool,
    natural_20: bool,
    natural_1: bool,
    timestamp: DateTime<Utc>,
}

/// A dice expression plus whatever free text followed it.
#[derive(Debug, PartialEq, Eq)]
struct RollRequest {
    formula: DiceFormula,
    label: Option<String>,
}

impl RollRequest {
    /// `3d6+2`, `3d6 + 2`, `1d20 for initiative`, or nothing for a d20.
    fn from_args(args: &CommandArgs) -> Result<Self, DiceParseError> {
        if args.plain_text.is_empty() {
            return Ok(Self {
                formula: DiceFormula::d20(),
                label: None,
            });
        }

        let compact: String = args.plain_text.concat().split_whitespace().collect();
        if let Ok(formula) = DiceFormula::parse(&compact) {
            return Ok(Self {
                formula,
                label: None,
            });
        }

        let formula = DiceFormula::parse(&args.plain_text[0])?;
        let label = args.plain_text[1..].join(" ");
        Ok(Self {
            formula,
            label: Some(label).filter(|l| !l.trim().is_empty()),
        })
    }
}

/// `/roll [NdM+K]` - plain dice roll, `1d20` by default.
pub struct RollCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl RollCommand {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        let metadata = CommandMetadata::new(
            "roll",
            "Roll dice using NdM+K notation",
            "/roll [NdM+K] [label] [--private] [--reason=text]",
            CommandCategory::Utility,
        )
        .aliases(["r", "dice"]);
        Self {
            metadata,
            clock,
            random,
        }
    }
}

#[async_trait]
impl CommandDefinition for RollCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, _ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();
        if let Err(e) = RollRequest::from_args(args) {
            result.error(format!("{} (try 1d20, 2d6+3 or d8)", e));
        }
        if args.flag("reason").is_some_and(|r| r.is_switch()) {
            result.warn("--reason needs a value, e.g. --reason=initiative");
        }
        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let request = RollRequest::from_args(args)?;
        let reason = args
            .flag("reason")
            .filter(|r| !r.is_switch())
            .map(|r| r.as_str().to_string())
            .or(request.label);
        let private = args.is_set("private");
        let result = support::roll(&request.formula, self.random.as_ref());

        let roller_name = ctx.actor_name().to_string();
        let mut message = format!(
            "{} rolls {}: {}",
            roller_name,
            request.formula,
            result.breakdown()
        );
        if let Some(reason) = &reason {
            message.push_str(&format!(" ({})", reason));
        }
        if result.is_natural_20() {
            message.push_str(" Natural 20!");
        } else if result.is_natural_1() {
            message.push_str(" Natural 1.");
        }
        if private {
            message = format!("[private] {}", message);
        }

        let timestamp = self.clock.now();
        let event = RollEvent {
            roller: support::actor_ref(ctx),
            roller_name,
            formula: request.formula.to_string(),
            total: result.total,
            natural_20: result.is_natural_20(),
            natural_1: result.is_natural_1(),
            result,
            reason,
            private,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, _ctx: &ExecutionContext) -> Vec<String> {
        ["1d20", "2d6", "1d100", "4d6", "--private", "--reason="]
            .map(String::from)
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{args, clock, fixed_now, random, table};

    fn roll(value: i32) -> RollCommand {
        RollCommand::new(clock(), random(value))
    }

    #[test]
    fn request_accepts_spaced_formula_and_labels() {
        let spaced = RollRequest::from_args(&args(&["3d6", "+", "2"])).unwrap();
        assert_eq!(spaced.formula.to_string(), "3d6+2");
        assert_eq!(spaced.label, None);

        let labelled = RollRequest::from_args(&args(&["1d20", "for", "initiative"])).unwrap();
        assert_eq!(labelled.formula, DiceFormula::d20());
        assert_eq!(labelled.label.as_deref(), Some("for initiative"));

        let default = RollRequest::from_args(&CommandArgs::default()).unwrap();
        assert_eq!(default.formula, DiceFormula::d20());
    }

    #[test]
    fn rejects_garbage() {
        let t = table();
        let result = roll(3).validate(&args(&["lots"]), &t.ctx);
        assert!(!result.is_valid());
        assert!(result.errors[0].ends_with("(try 1d20, 2d6+3 or d8)"));
    }

    #[tokio::test]
    async fn rolls_formula_with_modifier() {
        let t = table();
        let result = roll(3)
            .execute(&args(&["3d6+2"]), &t.ctx)
            .await
            .unwrap();
        assert_eq!(result.message, "Mira rolls 3d6+2: 3d6[3, 3, 3] + 2 = 11");
        assert_eq!(result.data.unwrap()["total"], 11);
    }

    #[tokio::test]
    async fn private_roll_with_reason() {
        let t = table();
        let result = roll(20)
            .execute(&args(&["--private", "--reason=stealth"]), &t.ctx)
            .await
            .unwrap();
        assert_eq!(
            result.message,
            "[private] Mira rolls 1d20: 1d20(20) = 20 (stealth) Natural 20!"
        );
        let data = result.data.unwrap();
        assert_eq!(data["private"], true);
        assert_eq!(data["natural20"], true);
    }

    #[tokio::test]
    async fn rolls_d20_once_through_the_random_port() {
        use crate::infrastructure::ports::{MockClockPort, MockRandomPort};

        let mut random = MockRandomPort::new();
        random
            .expect_gen_range()
            .withf(|min, max| *min == 1 && *max == 20)
            .times(1)
            .return_const(1);
        let mut clock = MockClockPort::new();
        clock.expect_now().times(1).return_const(fixed_now());

        let t = table();
        let result = RollCommand::new(Arc::new(clock), Arc::new(random))
            .execute(&CommandArgs::default(), &t.ctx)
            .await
            .unwrap();
        assert_eq!(result.message, "Mira rolls 1d20: 1d20(1) = 1 Natural 1.");
        assert_eq!(result.timestamp, fixed_now());
    }
}
