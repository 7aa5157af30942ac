use std::time::Duration;

use crate::limiter::Limiter;
use crate::pause::PauseController;

/// Exponential backoff between attempts: `base * 2^(attempt-1)`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff {
    /// Delay to sleep after failed attempt `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        self.base.saturating_mul(exp).min(self.max)
    }
}

/// Options for [`run`](super::run).
///
/// The pause gate and limiter are optional so the loop can be used on its own;
/// batch runs always set both.
#[derive(Debug, Clone)]
pub struct RetryOptions {
    tries: u32,
    backoff: Option<Backoff>,
    pause: Option<PauseController>,
    limiter: Option<Limiter>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            tries: 3,
            backoff: None,
            pause: None,
            limiter: None,
        }
    }
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum attempts, including the first. Zero is treated as one.
    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Block on this gate before every attempt.
    pub fn pause(mut self, pause: PauseController) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Take a permit from this limiter before every attempt after the first.
    pub fn limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn max_tries(&self) -> u32 {
        self.tries.max(1)
    }

    pub(super) fn backoff_delay(&self, attempt: u32) -> Option<Duration> {
        self.backoff.map(|b| b.delay(attempt))
    }

    pub(super) fn pause_gate(&self) -> Option<&PauseController> {
        self.pause.as_ref()
    }

    pub(super) fn attempt_limiter(&self) -> Option<&Limiter> {
        self.limiter.as_ref()
    }
}
