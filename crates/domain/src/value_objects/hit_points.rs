//! Hit point snapshot with projection helpers.
//!
//! Projections describe what a value *would* become; nothing here mutates
//! the snapshot a caller handed in.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
}

impl HitPoints {
    pub fn new(current: i32, max: i32) -> Result<Self, DomainError> {
        if max < 1 {
            return Err(DomainError::validation("Maximum hit points must be positive"));
        }
        if current > max {
            return Err(DomainError::out_of_range(
                "current hit points",
                i64::MIN,
                max as i64,
                current as i64,
            ));
        }
        Ok(Self { current, max })
    }

    /// Hit points after taking `damage`, floored at zero.
    pub fn after_damage(&self, damage: i32) -> i32 {
        self.current.saturating_sub(damage.max(0)).max(0)
    }

    /// Hit points after receiving `healing`, capped at max.
    pub fn after_healing(&self, healing: i32) -> i32 {
        self.current.saturating_add(healing.max(0)).min(self.max)
    }

    /// Healing actually absorbed before hitting the cap.
    pub fn effective_healing(&self, healing: i32) -> i32 {
        self.after_healing(healing)
            .saturating_sub(self.current.min(self.max))
    }

    pub fn missing(&self) -> i32 {
        self.max.saturating_sub(self.current).max(0)
    }

    pub fn is_down(&self) -> bool {
        self.current <= 0
    }
}
