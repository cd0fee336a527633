use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabletalk_domain::{DiceFormula, ExecutionContext, MAX_MODIFIER};

use super::support::{self, check_single_target, dice_flag, roster_tokens, typed_flag, RollSummary};
use super::{
    CharacterRef, CommandCategory, CommandDefinition, CommandError, CommandMetadata,
    ExecutionResult, ValidationResult,
};
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::parser::CommandArgs;

const ONE_TARGET: &str = "Attack one target at a time";

/// Damage rolled when no `--damage` is given.
const DEFAULT_DAMAGE: DiceFormula = DiceFormula {
    dice_count: 1,
    die_size: 6,
    modifier: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    Normal,
    Advantage,
    Disadvantage,
}

impl RollMode {
    fn from_args(args: &CommandArgs) -> Self {
        match (args.is_set("advantage"), args.is_set("disadvantage")) {
            (true, false) => RollMode::Advantage,
            (false, true) => RollMode::Disadvantage,
            _ => RollMode::Normal,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttackEvent {
    attacker: CharacterRef,
    target: CharacterRef,
    roll_mode: RollMode,
    /// Every d20 rolled; two under advantage or disadvantage
    d20_rolls: Vec<i32>,
    natural: i32,
    bonus: i32,
    attack_total: i32,
    target_armor_class: i32,
    hit: bool,
    critical: bool,
    fumble: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    damage: Option<RollSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_hit_points_after: Option<i32>,
    timestamp: DateTime<Utc>,
}

/// `/attack @target` - d20 + bonus against armor class, damage on a hit.
pub struct AttackCommand {
    metadata: CommandMetadata,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl AttackCommand {
    pub fn new(clock: Arc<dyn ClockPort>, random: Arc<dyn RandomPort>) -> Self {
        let metadata = CommandMetadata::new(
            "attack",
            "Make an attack roll against a target",
            "/attack @target [--bonus=N] [--damage=XdY+Z] [--advantage|--disadvantage]",
            CommandCategory::Combat,
        )
        .aliases(["atk", "a", "hit"])
        .requires_target()
        .requires_combat();
        Self {
            metadata,
            clock,
            random,
        }
    }

    fn roll_d20(&self, mode: RollMode) -> (i32, Vec<i32>) {
        let first = self.random.gen_range(1, 20);
        if mode == RollMode::Normal {
            return (first, vec![first]);
        }
        let second = self.random.gen_range(1, 20);
        let natural = match mode {
            RollMode::Advantage => first.max(second),
            _ => first.min(second),
        };
        (natural, vec![first, second])
    }
}

#[async_trait]
impl CommandDefinition for AttackCommand {
    fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    fn validate(&self, args: &CommandArgs, ctx: &ExecutionContext) -> ValidationResult {
        let mut result = ValidationResult::ok();

        match args.targets.len() {
            0 => result.error("Choose a target with @name"),
            1 => {
                let target = check_single_target(args, ctx, &mut result, ONE_TARGET);
                if let Some(target) = target {
                    if ctx.character_id == Some(target.id) {
                        result.error("You cannot attack yourself");
                    } else if target.hit_points.is_some_and(|hp| hp.is_down()) {
                        result.warn(format!("{} is already down", target.name));
                    }
                }
            }
            _ => result.error(ONE_TARGET),
        }

        if let Some(bonus) = typed_flag::<i32>(args, "bonus", "a whole number", &mut result) {
            if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&bonus) {
                result.error(format!(
                    "--bonus must be between -{} and {}",
                    MAX_MODIFIER, MAX_MODIFIER
                ));
            }
        }
        dice_flag(args, "damage", &mut result);

        if args.is_set("advantage") && args.is_set("disadvantage") {
            result.warn("Advantage and disadvantage cancel out");
        }
        support::turn_warning(ctx, &mut result);

        result
    }

    async fn execute(
        &self,
        args: &CommandArgs,
        ctx: &ExecutionContext,
    ) -> Result<ExecutionResult, CommandError> {
        let attacker = support::actor(ctx)?;
        let reference = args
            .first_target()
            .ok_or_else(|| CommandError::Internal("attack without a target".into()))?;
        let target = support::resolve(ctx, reference)?;

        let mode = RollMode::from_args(args);
        let bonus: i32 = support::flag_or(args, "bonus", 0);
        let (natural, d20_rolls) = self.roll_d20(mode);
        let attack_total = natural.saturating_add(bonus);
        let armor_class = target.armor_class_or_default();

        let critical = natural == 20;
        let fumble = natural == 1;
        let hit = !fumble && (critical || attack_total >= armor_class);

        let damage = if hit {
            let formula: DiceFormula = support::flag_or(args, "damage", DEFAULT_DAMAGE);
            let formula = if critical { formula.doubled() } else { formula };
            Some(support::roll(&formula, self.random.as_ref()))
        } else {
            None
        };
        let damage_total = damage.as_ref().map(|d| d.total.max(0));
        let hp_after = match (target.hit_points, damage_total) {
            (Some(hp), Some(dmg)) => Some(hp.after_damage(dmg)),
            _ => None,
        };

        let mut message = format!(
            "{} attacks {}: {} vs AC {}.",
            attacker.name, target.name, attack_total, armor_class
        );
        match (damage_total, critical, fumble) {
            (_, _, true) => message.push_str(" Natural 1, a clean miss."),
            (Some(dmg), true, _) => {
                message.push_str(&format!(" Critical hit for {} damage!", dmg))
            }
            (Some(dmg), false, _) => message.push_str(&format!(" Hit for {} damage.", dmg)),
            (None, _, _) => message.push_str(" Miss."),
        }
        if let Some(hp) = hp_after {
            if hp <= 0 {
                message.push_str(&format!(" {} goes down.", target.name));
            }
        }

        let timestamp = self.clock.now();
        let event = AttackEvent {
            attacker: attacker.into(),
            target: target.into(),
            roll_mode: mode,
            d20_rolls,
            natural,
            bonus,
            attack_total,
            target_armor_class: armor_class,
            hit,
            critical,
            fumble,
            damage: damage.as_ref().map(RollSummary::from),
            target_hit_points_after: hp_after,
            timestamp,
        };
        ExecutionResult::success(message, timestamp).with_event(&event)
    }

    fn autocomplete(&self, _args: &CommandArgs, ctx: &ExecutionContext) -> Vec<String> {
        let mut out = roster_tokens(ctx, false);
        out.extend(
            [
                "--advantage",
                "--disadvantage",
                "--bonus=",
                "--damage=1d6",
                "--damage=1d8",
                "--damage=2d6",
            ]
            .map(String::from),
        );
        out
    }
}
