//! Dice rolling value objects and parsing
//!
//! Supports dice formulas like "1d20+5", "2d6-1", "d8", "3d6+2".
//! Randomness is injected by the caller so results stay reproducible in tests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest flat modifier a formula may carry, in either direction.
pub const MAX_MODIFIER: i32 = 1000;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
    /// Modifier outside `-MAX_MODIFIER..=MAX_MODIFIER`
    #[error("Modifier must be between -{} and {}", MAX_MODIFIER, MAX_MODIFIER)]
    ModifierOverflow,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&modifier) {
            return Err(DiceParseError::ModifierOverflow);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// A single d20, the default check die.
    pub fn d20() -> Self {
        Self {
            dice_count: 1,
            die_size: 20,
            modifier: 0,
        }
    }

    /// Parse a dice formula string like "1d20+5", "2d6-1", "1d100"
    ///
    /// Supported formats:
    /// - "XdY" - Roll X dice of size Y
    /// - "XdY+Z" - Roll X dice of size Y, add Z
    /// - "XdY-Z" - Roll X dice of size Y, subtract Z
    /// - "dY" - Roll 1 die of size Y (shorthand)
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };

        let after_d = &input[d_pos + 1..];

        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            if !mod_str.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid modifier: '+{}'",
                    mod_str
                )));
            }
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.rfind('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            if !mod_str.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid modifier: '-{}'",
                    mod_str
                )));
            }
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus_pos], -modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;

        Self::new(dice_count, die_size, modifier)
    }

    /// Same dice doubled, modifier unchanged (critical hits).
    pub fn doubled(&self) -> Self {
        Self {
            dice_count: self.dice_count.saturating_mul(2),
            ..*self
        }
    }

    /// Same dice with an extra flat modifier.
    pub fn with_bonus(&self, bonus: i32) -> Self {
        Self {
            modifier: self.modifier.saturating_add(bonus),
            ..*self
        }
    }

    /// Roll the dice using the supplied inclusive range generator.
    ///
    /// `gen_range(min, max)` must return a value in `min..=max`.
    pub fn roll_with(&self, mut gen_range: impl FnMut(i32, i32) -> i32) -> DiceRollResult {
        let individual_rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| gen_range(1, self.die_size as i32))
            .collect();

        let dice_total = individual_rolls
            .iter()
            .fold(0i32, |sum, roll| sum.saturating_add(*roll));
        let total = dice_total.saturating_add(self.modifier);

        DiceRollResult {
            formula: *self,
            individual_rolls,
            dice_total,
            modifier_applied: self.modifier,
            total,
        }
    }

    /// Get the minimum possible roll
    pub fn min_roll(&self) -> i32 {
        (self.dice_count as i32).saturating_add(self.modifier)
    }

    /// Get the maximum possible roll
    pub fn max_roll(&self) -> i32 {
        (self.dice_count as i32 * self.die_size as i32).saturating_add(self.modifier)
    }
}

impl FromStr for DiceFormula {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    /// The formula that was rolled
    pub formula: DiceFormula,
    /// Individual die results
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    /// Modifier that was applied
    pub modifier_applied: i32,
    /// Final total (dice_total + modifier)
    pub total: i32,
}

impl DiceRollResult {
    /// Format as a breakdown string (e.g., "1d20(14) + 5 = 19")
    pub fn breakdown(&self) -> String {
        let dice = format!("{}d{}", self.formula.dice_count, self.formula.die_size);
        let rolls = if self.individual_rolls.len() == 1 {
            format!("({})", self.individual_rolls[0])
        } else {
            let parts: Vec<String> = self
                .individual_rolls
                .iter()
                .map(|r| r.to_string())
                .collect();
            format!("[{}]", parts.join(", "))
        };

        match self.modifier_applied {
            0 => format!("{}{} = {}", dice, rolls, self.total),
            m if m > 0 => format!("{}{} + {} = {}", dice, rolls, m, self.total),
            m => format!("{}{} - {} = {}", dice, rolls, -m, self.total),
        }
    }

    /// Check if this is a natural 20 (single d20)
    pub fn is_natural_20(&self) -> bool {
        self.formula.die_size == 20
            && self.formula.dice_count == 1
            && self.individual_rolls.first() == Some(&20)
    }

    /// Check if this is a natural 1 (single d20)
    pub fn is_natural_1(&self) -> bool {
        self.formula.die_size == 20
            && self.formula.dice_count == 1
            && self.individual_rolls.first() == Some(&1)
    }
}
