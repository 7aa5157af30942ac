//! Fixed-window permit limiter shared by every task of one queue.
//!
//! Permits refill to the current capacity once per window. `decrement` shrinks
//! the capacity when the network misbehaves so a flaky connection does not turn
//! into a burst of retries; how it grows back is set by [`Recovery`].

mod policy;

pub use policy::{Decrement, LimiterPolicy, Recovery, MAX_WINDOW};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Cheap-to-clone handle; clones share the same permit state.
#[derive(Debug, Clone)]
pub struct Limiter {
    inner: Arc<LimiterInner>,
}

#[derive(Debug)]
struct LimiterInner {
    policy: LimiterPolicy,
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    /// Permits left in the current window.
    permits: u32,
    /// Effective capacity (<= policy.capacity after decrements).
    capacity: u32,
    window_start: Instant,
}

impl Limiter {
    /// Limiter granting `capacity` permits per `window`, with default decrement/recovery.
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self::with_policy(LimiterPolicy::new(window, capacity))
    }

    pub fn with_policy(policy: LimiterPolicy) -> Self {
        let policy = policy.normalized();
        Self {
            inner: Arc::new(LimiterInner {
                state: Mutex::new(LimiterState {
                    permits: policy.capacity,
                    capacity: policy.capacity,
                    window_start: Instant::now(),
                }),
                policy,
            }),
        }
    }

    /// Wait until a permit is available and consume it.
    pub async fn wait(&self) {
        loop {
            let wait_for = {
                let mut state = self.lock();
                let now = Instant::now();
                self.refill(&mut state, now);
                if state.permits > 0 {
                    state.permits -= 1;
                    return;
                }
                match state.window_start.checked_add(self.inner.policy.window) {
                    Some(next) => next.saturating_duration_since(now),
                    None => self.inner.policy.window,
                }
            };

            tracing::trace!(wait_ms = wait_for.as_millis() as u64, "limiter exhausted, waiting");
            // Sleep outside the lock.
            tokio::time::sleep(wait_for).await;
        }
    }

    /// Shrink capacity after a transient network failure. Permits already
    /// handed out are not revoked; the rest of this window is clamped.
    pub fn decrement(&self) {
        let mut state = self.lock();
        let before = state.capacity;
        state.capacity = self.inner.policy.shrink(before);
        state.permits = state.permits.min(state.capacity);
        tracing::warn!(
            from = before,
            to = state.capacity,
            "limiter capacity reduced after network failure"
        );
    }

    /// Permits that could be taken right now without waiting.
    pub fn available(&self) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state, Instant::now());
        state.permits
    }

    /// Current (possibly reduced) capacity per window.
    pub fn capacity(&self) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state, Instant::now());
        state.capacity
    }

    /// Capacity the limiter was built with.
    pub fn configured_capacity(&self) -> u32 {
        self.inner.policy.capacity
    }

    pub fn window(&self) -> Duration {
        self.inner.policy.window
    }

    /// Restore the configured capacity and start a fresh, full window.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.capacity = self.inner.policy.capacity;
        state.permits = state.capacity;
        state.window_start = Instant::now();
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        // State is plain counters; a panic elsewhere cannot leave it torn.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refill(&self, state: &mut LimiterState, now: Instant) {
        let window = self.inner.policy.window;
        let elapsed = now.saturating_duration_since(state.window_start);
        if elapsed < window {
            return;
        }
        let windows = (elapsed.as_nanos() / window.as_nanos()).min(u32::MAX as u128) as u32;
        state.window_start += window * windows;
        state.capacity = self.inner.policy.recover(state.capacity, windows);
        state.permits = state.capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(limiter: &Limiter) -> u32 {
        let mut n = 0;
        while limiter.available() > 0 {
            limiter.wait().await;
            n += 1;
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn grants_capacity_then_blocks_until_refill() {
        let limiter = Limiter::new(Duration::from_secs(60), 3);
        assert_eq!(drain(&limiter).await, 3);

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn decrement_reduces_permits_per_window() {
        let limiter = Limiter::new(Duration::from_secs(60), 10);
        let before = drain(&limiter).await;

        limiter.decrement();
        limiter.decrement();
        assert_eq!(limiter.available(), 0);

        tokio::time::advance(Duration::from_secs(60)).await;
        let after = drain(&limiter).await;
        assert!(after < before);
        assert_eq!(after, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn decrement_never_drops_below_one_permit() {
        let limiter = Limiter::new(Duration::from_secs(1), 4);
        for _ in 0..20 {
            limiter.decrement();
        }
        assert_eq!(limiter.capacity(), 1);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn decrement_clamps_remaining_permits_of_current_window() {
        let limiter = Limiter::new(Duration::from_secs(60), 8);
        limiter.wait().await;
        assert_eq!(limiter.available(), 7);
        limiter.decrement();
        assert_eq!(limiter.available(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn step_recovery_grows_back_per_window() {
        let limiter = Limiter::with_policy(LimiterPolicy {
            recovery: Recovery::Step { amount: 2 },
            ..LimiterPolicy::new(Duration::from_secs(10), 8)
        });
        limiter.decrement();
        limiter.decrement();
        assert_eq!(limiter.capacity(), 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(limiter.capacity(), 4);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(limiter.capacity(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_configured_capacity() {
        let limiter = Limiter::new(Duration::from_secs(60), 6);
        limiter.decrement();
        assert_eq!(limiter.capacity(), 3);
        limiter.reset();
        assert_eq!(limiter.capacity(), limiter.configured_capacity());
        assert_eq!(limiter.available(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_window_is_capped_and_waits_without_panicking() {
        let limiter = Limiter::new(Duration::from_secs(i64::MAX as u64), 1);
        assert_eq!(limiter.window(), MAX_WINDOW);
        limiter.wait().await;

        let blocked = tokio::time::timeout(Duration::from_secs(1), limiter.wait()).await;
        assert!(blocked.is_err(), "second permit waits for the next window");

        tokio::time::advance(MAX_WINDOW).await;
        limiter.wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_state() {
        let a = Limiter::new(Duration::from_secs(60), 2);
        let b = a.clone();
        a.wait().await;
        b.wait().await;
        assert_eq!(a.available(), 0);
    }
}
