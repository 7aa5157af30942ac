//! Limiter policy: window, capacity bounds, and how capacity shrinks and recovers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest accepted refill window (one year).
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// How `Limiter::decrement` shrinks the capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Decrement {
    /// Halve the current capacity.
    #[default]
    Halve,
    /// Subtract a fixed number of permits per call.
    Subtract { amount: u32 },
}

/// How a reduced capacity grows back at refill time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Recovery {
    /// Keep the reduced capacity until `Limiter::reset`.
    #[default]
    Hold,
    /// Restore the configured capacity at the next refill.
    Full,
    /// Add `amount` permits back per elapsed window, up to the configured capacity.
    Step { amount: u32 },
}

/// Full limiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterPolicy {
    /// Refill interval.
    pub window: Duration,
    /// Permits granted per window before any decrement.
    pub capacity: u32,
    /// Floor for `decrement`; at least 1.
    pub min_capacity: u32,
    pub decrement: Decrement,
    pub recovery: Recovery,
}

impl LimiterPolicy {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            window,
            capacity,
            ..Self::default()
        }
    }

    /// Clamp degenerate values: the window is kept within 1ms..=[`MAX_WINDOW`],
    /// capacities become >= 1, and `min_capacity` never exceeds `capacity`.
    pub(super) fn normalized(self) -> Self {
        let capacity = self.capacity.max(1);
        Self {
            window: self.window.clamp(Duration::from_millis(1), MAX_WINDOW),
            capacity,
            min_capacity: self.min_capacity.clamp(1, capacity),
            decrement: self.decrement,
            recovery: self.recovery,
        }
    }

    /// Capacity after one decrement from `current`.
    pub(super) fn shrink(&self, current: u32) -> u32 {
        let next = match self.decrement {
            Decrement::Halve => current / 2,
            Decrement::Subtract { amount } => current.saturating_sub(amount),
        };
        next.max(self.min_capacity)
    }

    /// Capacity after `windows` refills starting from `current`.
    pub(super) fn recover(&self, current: u32, windows: u32) -> u32 {
        match self.recovery {
            Recovery::Hold => current,
            Recovery::Full => self.capacity,
            Recovery::Step { amount } => current
                .saturating_add(amount.saturating_mul(windows))
                .min(self.capacity),
        }
    }
}

impl Default for LimiterPolicy {
    /// 100 permits per minute, halving on decrement, no automatic recovery.
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            capacity: 100,
            min_capacity: 1,
            decrement: Decrement::Halve,
            recovery: Recovery::Hold,
        }
    }
}
