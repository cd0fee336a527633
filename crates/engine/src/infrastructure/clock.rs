//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses the thread-local RNG.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        if max <= min {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed random for testing. Values are clamped into the requested range.
#[cfg(test)]
pub struct FixedRandom(pub i32);

#[cfg(test)]
impl RandomPort for FixedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        self.0.clamp(min, max.max(min))
    }
}

/// Replays a fixed sequence of values, cycling when exhausted.
#[cfg(test)]
pub struct SequenceRandom {
    values: Vec<i32>,
    next: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl SequenceRandom {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl RandomPort for SequenceRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        if self.values.is_empty() {
            return min;
        }
        let idx = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            % self.values.len();
        self.values[idx].clamp(min, max.max(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_random_bounds() {
        let rng = SystemRandom::new();
        for _ in 0..100 {
            let value = rng.gen_range(1, 20);
            assert!((1..=20).contains(&value), "Value {} out of range", value);
        }
    }

    #[test]
    fn test_system_random_degenerate_range() {
        assert_eq!(SystemRandom::new().gen_range(4, 4), 4);
    }

    #[test]
    fn test_sequence_random_cycles() {
        let rng = SequenceRandom::new(vec![3, 30]);
        assert_eq!(rng.gen_range(1, 20), 3);
        assert_eq!(rng.gen_range(1, 20), 20);
        assert_eq!(rng.gen_range(1, 20), 3);
    }
}
