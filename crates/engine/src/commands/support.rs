//! Helpers shared by the built-in commands.

use std::str::FromStr;

use serde::Serialize;
use tabletalk_domain::{
    is_self_reference, CharacterSnapshot, DiceFormula, DiceParseError, DiceRollResult,
    ExecutionContext, MAX_MODIFIER,
};

use super::{CharacterRef, CommandError, ValidationResult};
use crate::infrastructure::ports::RandomPort;
use crate::parser::{CommandArgs, FLAG_PREFIX, TARGET_MARKER};

/// Target word meaning every targetable character.
pub(crate) const ALL_TARGETS: &str = "all";

pub(crate) fn roll(formula: &DiceFormula, random: &dyn RandomPort) -> DiceRollResult {
    formula.roll_with(|min, max| random.gen_range(min, max))
}

/// Flat number or dice formula, e.g. `--amount=5` or `--amount=2d4+2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Amount {
    Fixed(i32),
    Dice(DiceFormula),
}

impl Amount {
    pub(crate) fn roll(&self, random: &dyn RandomPort) -> (i32, Option<DiceRollResult>) {
        match self {
            Amount::Fixed(n) => (*n, None),
            Amount::Dice(formula) => {
                let result = roll(formula, random);
                (result.total.max(0), Some(result))
            }
        }
    }
}

impl FromStr for Amount {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.parse::<i32>() {
            Ok(n) if n < 0 => Err(DiceParseError::InvalidFormat(format!(
                "Amount cannot be negative: '{}'",
                s
            ))),
            Ok(n) if n > MAX_MODIFIER => Err(DiceParseError::InvalidFormat(format!(
                "Amount cannot exceed {}: '{}'",
                MAX_MODIFIER, s
            ))),
            Ok(n) => Ok(Amount::Fixed(n)),
            Err(_) => Ok(Amount::Dice(DiceFormula::parse(s)?)),
        }
    }
}

/// Resolve every `@target`, recording unknown names as errors and off-scene
/// characters as warnings. `@all` is skipped; callers expand it themselves.
pub(crate) fn check_targets<'a>(
    args: &CommandArgs,
    ctx: &'a ExecutionContext,
    result: &mut ValidationResult,
) -> Vec<&'a CharacterSnapshot> {
    let mut resolved = Vec::new();
    for target in &args.targets {
        if target.eq_ignore_ascii_case(ALL_TARGETS) {
            continue;
        }
        match ctx.resolve_target(target) {
            Ok(character) => {
                if ctx.is_off_scene(character) {
                    result.warn(format!("{} is not in the current scene", character.name));
                }
                resolved.push(character);
            }
            Err(_) if is_self_reference(target) => {
                result.error("You have no character to act as");
            }
            Err(_) => result.error(format!("Unknown target '{}'", target)),
        }
    }
    resolved
}

/// Resolve the only `@target` of a single-target command. `@all` names many
/// characters, so it is recorded as `one_at_a_time`.
pub(crate) fn check_single_target<'a>(
    args: &CommandArgs,
    ctx: &'a ExecutionContext,
    result: &mut ValidationResult,
    one_at_a_time: &str,
) -> Option<&'a CharacterSnapshot> {
    if args
        .targets
        .iter()
        .any(|target| target.eq_ignore_ascii_case(ALL_TARGETS))
    {
        result.error(one_at_a_time);
        return None;
    }
    check_targets(args, ctx, result).into_iter().next()
}

/// Resolve one reference at execution time.
pub(crate) fn resolve<'a>(
    ctx: &'a ExecutionContext,
    reference: &str,
) -> Result<&'a CharacterSnapshot, CommandError> {
    ctx.resolve_target(reference).map_err(|_| {
        if is_self_reference(reference) {
            CommandError::MissingActor
        } else {
            CommandError::UnknownTarget(reference.to_string())
        }
    })
}

/// Resolve every target, expanding `@all` to the targetable roster minus the actor.
pub(crate) fn resolve_all<'a>(
    args: &CommandArgs,
    ctx: &'a ExecutionContext,
) -> Result<Vec<&'a CharacterSnapshot>, CommandError> {
    let mut resolved: Vec<&CharacterSnapshot> = Vec::new();
    for target in &args.targets {
        if target.eq_ignore_ascii_case(ALL_TARGETS) {
            let actor = ctx.character_id;
            resolved.extend(ctx.targetable_characters().filter(|c| Some(c.id) != actor));
        } else {
            resolved.push(resolve(ctx, target)?);
        }
    }
    let mut seen = std::collections::HashSet::new();
    resolved.retain(|c| seen.insert(c.id));
    Ok(resolved)
}

pub(crate) fn actor(ctx: &ExecutionContext) -> Result<&CharacterSnapshot, CommandError> {
    ctx.current_character.as_ref().ok_or(CommandError::MissingActor)
}

pub(crate) fn actor_ref(ctx: &ExecutionContext) -> Option<CharacterRef> {
    ctx.current_character.as_ref().map(CharacterRef::from)
}

/// Parse a typed flag, recording `--name must be <expected>` on failure.
pub(crate) fn typed_flag<T: FromStr>(
    args: &CommandArgs,
    name: &str,
    expected: &str,
    result: &mut ValidationResult,
) -> Option<T> {
    let value = args.flag(name)?;
    match value.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            result.error(format!(
                "{}{} must be {} (got '{}')",
                FLAG_PREFIX, name, expected, value
            ));
            None
        }
    }
}

/// Parse a dice flag, recording the dice error on failure.
pub(crate) fn dice_flag(
    args: &CommandArgs,
    name: &str,
    result: &mut ValidationResult,
) -> Option<DiceFormula> {
    let value = args.flag(name)?;
    match DiceFormula::parse(value.as_str()) {
        Ok(formula) => Some(formula),
        Err(e) => {
            result.error(format!("{}{}: {}", FLAG_PREFIX, name, e));
            None
        }
    }
}

/// Same as [`typed_flag`] but for execution, where validation already passed.
pub(crate) fn flag_or<T: FromStr>(args: &CommandArgs, name: &str, default: T) -> T {
    args.flag(name)
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn turn_warning(ctx: &ExecutionContext, result: &mut ValidationResult) {
    if ctx.settings.warn_out_of_turn && ctx.environment.combat_active && ctx.is_out_of_turn() {
        result.warn("It is not your turn");
    }
}

/// `@Name`, quoted when the name has whitespace.
pub(crate) fn target_token(name: &str) -> String {
    if name.chars().any(char::is_whitespace) {
        format!("{}\"{}\"", TARGET_MARKER, name)
    } else {
        format!("{}{}", TARGET_MARKER, name)
    }
}

/// `@Name` tokens for the targetable roster.
pub(crate) fn roster_tokens(ctx: &ExecutionContext, include_actor: bool) -> Vec<String> {
    ctx.targetable_characters()
        .filter(|c| include_actor || Some(c.id) != ctx.character_id)
        .map(|c| target_token(&c.name))
        .collect()
}

pub(crate) fn flag_tokens(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| format!("{}{}", FLAG_PREFIX, name))
        .collect()
}

/// "A", "A and B", "A, B and C".
pub(crate) fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Dice breakdown for event payloads and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RollSummary {
    pub formula: String,
    pub rolls: Vec<i32>,
    pub total: i32,
    pub breakdown: String,
}

impl From<&DiceRollResult> for RollSummary {
    fn from(result: &DiceRollResult) -> Self {
        Self {
            formula: result.formula.to_string(),
            rolls: result.individual_rolls.clone(),
            total: result.total,
            breakdown: result.breakdown(),
        }
    }
}
