//! Port traits for infrastructure boundaries.
//!
//! The interpreter itself has no I/O. Ports exist so that commands can be
//! tested deterministically:
//! - Clock (timestamps on results and history records)
//! - Random (dice)

use chrono::{DateTime, Utc};

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn gen_range(&self, min: i32, max: i32) -> i32;
}
