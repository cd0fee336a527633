//! Value objects - immutable types describing game quantities.

mod dice;
mod hit_points;

pub use dice::{DiceFormula, DiceParseError, DiceRollResult, MAX_MODIFIER};
pub use hit_points::HitPoints;
