//! Pause gate that serializes interactive credential refresh.
//!
//! Many tasks can notice an expired credential at the same moment. Exactly one
//! of them wins [`PauseController::try_pause`] and becomes the refresher; the
//! rest block in [`PauseController::wait_if_paused`] until the winner's
//! [`PauseGuard`] is resumed or dropped, at which point all of them are
//! released together.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared `Running`/`Paused` flag. Clones refer to the same gate.
#[derive(Debug, Clone)]
pub struct PauseController {
    paused: Arc<watch::Sender<bool>>,
}

/// Held by the single refresher. Unpauses on `resume` or drop.
#[derive(Debug)]
#[must_use = "dropping the guard immediately unpauses"]
pub struct PauseGuard {
    paused: Arc<watch::Sender<bool>>,
}

impl PauseController {
    /// New gate in the `Running` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            paused: Arc::new(tx),
        }
    }

    /// Try to move `Running -> Paused`. Returns the guard to exactly one caller;
    /// everyone else (including callers arriving while already paused) gets `None`
    /// and should `wait_if_paused` instead of refreshing themselves.
    pub fn try_pause(&self) -> Option<PauseGuard> {
        let won = self.paused.send_if_modified(|paused| {
            if *paused {
                false
            } else {
                *paused = true;
                true
            }
        });
        if won {
            tracing::debug!("paused for credential refresh");
            Some(PauseGuard {
                paused: Arc::clone(&self.paused),
            })
        } else {
            None
        }
    }

    /// Returns immediately when running; otherwise blocks until unpaused.
    pub async fn wait_if_paused(&self) {
        let mut rx = self.paused.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|paused| !*paused).await;
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGuard {
    /// `Paused -> Running`, releasing every blocked waiter.
    pub fn resume(self) {
        drop(self);
    }
}

impl Drop for PauseGuard {
    fn drop(&mut self) {
        self.paused.send_replace(false);
        tracing::debug!("resumed after credential refresh");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn wait_is_noop_when_running() {
        let pc = PauseController::new();
        assert!(!pc.is_paused());
        tokio::time::timeout(Duration::from_secs(1), pc.wait_if_paused())
            .await
            .expect("should not block while running");
    }

    #[tokio::test]
    async fn second_pause_loses_while_paused() {
        let pc = PauseController::new();
        let guard = pc.try_pause().expect("first caller wins");
        assert!(pc.is_paused());
        assert!(pc.try_pause().is_none());
        guard.resume();
        assert!(!pc.is_paused());
        // Reusable across cycles.
        assert!(pc.try_pause().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn exactly_one_of_many_concurrent_pausers_wins() {
        let pc = PauseController::new();
        let winners = Arc::new(AtomicUsize::new(0));
        let attempted = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let (guard_tx, guard_rx) = tokio::sync::oneshot::channel();
        let guard_tx = Arc::new(std::sync::Mutex::new(Some(guard_tx)));

        let mut handles = Vec::new();
        for _ in 0..32 {
            let pc = pc.clone();
            let winners = Arc::clone(&winners);
            let attempted = Arc::clone(&attempted);
            let released = Arc::clone(&released);
            let guard_tx = Arc::clone(&guard_tx);
            handles.push(tokio::spawn(async move {
                let outcome = pc.try_pause();
                attempted.fetch_add(1, Ordering::SeqCst);
                match outcome {
                    Some(guard) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                        if let Some(tx) = guard_tx.lock().unwrap().take() {
                            let _ = tx.send(guard);
                        }
                    }
                    None => {
                        pc.wait_if_paused().await;
                        released.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }));
        }

        let guard = guard_rx.await.unwrap();
        while attempted.load(Ordering::SeqCst) < 32 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(released.load(Ordering::SeqCst), 0, "losers must block until resume");

        guard.resume();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(released.load(Ordering::SeqCst), 31);
    }

    #[tokio::test]
    async fn dropped_guard_releases_waiters() {
        let pc = PauseController::new();
        let guard = pc.try_pause().unwrap();
        let waiter = {
            let pc = pc.clone();
            tokio::spawn(async move { pc.wait_if_paused().await })
        };
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }
}
