//! Attempt loop: run a closure until success, a terminal error, or no tries left.

use std::fmt;
use std::future::Future;

use super::error::{Attempt, RetryError};
use super::policy::RetryOptions;

/// Runs `attempt_fn(try)` (1-based) until it succeeds or must stop.
///
/// Before each attempt the pause gate (if any) is awaited; before each attempt
/// after the first the limiter (if any) is awaited. A `Terminal` error ends the
/// loop at once; a `Retryable` error on the last try ends it as `Exhausted`.
pub async fn run<T, E, F, Fut>(options: &RetryOptions, mut attempt_fn: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
    E: fmt::Display,
{
    let tries = options.max_tries();
    let mut attempt = 1u32;
    loop {
        if let Some(pause) = options.pause_gate() {
            pause.wait_if_paused().await;
        }
        if attempt > 1 {
            if let Some(limiter) = options.attempt_limiter() {
                limiter.wait().await;
            }
        }

        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(Attempt::Terminal(error)) => {
                tracing::debug!(attempt, %error, "terminal error, not retrying");
                return Err(RetryError::Terminal { attempt, error });
            }
            Err(Attempt::Retryable(error)) => {
                if attempt >= tries {
                    tracing::debug!(attempts = attempt, %error, "retries exhausted");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        error,
                    });
                }
                tracing::debug!(attempt, tries, %error, "retryable error");
                if let Some(delay) = options.backoff_delay(attempt) {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}
