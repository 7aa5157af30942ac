//! Task queue: runs every submitted task concurrently, gated only by the
//! queue's [`Limiter`], and hands back a [`TaskHandle`] per task.
//!
//! The queue neither retries nor interprets errors. Each task body waits for
//! one limiter permit, runs, and resolves its handle exactly once. Callers
//! should drain every handle; there is no cancellation of in-flight tasks.

mod handle;

pub use handle::{TaskHandle, TaskLost, TaskResult};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::limiter::{Limiter, LimiterPolicy};

/// One limiter, any number of concurrently running tasks. Must be used from
/// within a tokio runtime.
///
/// The queue builds its own limiter, so two queues never draw from the same
/// permits. Clones of a queue share it.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    limiter: Limiter,
    next_id: Arc<AtomicU64>,
}

impl TaskQueue {
    /// Queue whose limiter grants `capacity` permits per `window`.
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self::with_policy(LimiterPolicy::new(window, capacity))
    }

    /// Queue with a limiter built from `policy`.
    pub fn with_policy(policy: LimiterPolicy) -> Self {
        Self {
            limiter: Limiter::with_policy(policy),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// The limiter gating this queue; retry loops wait on it between attempts.
    pub fn limiter(&self) -> &Limiter {
        &self.limiter
    }

    /// Spawn `task` immediately. The body starts once the limiter grants a
    /// permit; its output is delivered through the returned handle.
    pub fn queue_task<T, E, F, Fut>(&self, task: F) -> TaskHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TaskResult<T, E>> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (resolver, handle) = handle::cell(id);
        let limiter = self.limiter.clone();

        tracing::debug!(task = id, "task queued");
        tokio::spawn(
            async move {
                limiter.wait().await;
                let result = task().await;
                tracing::debug!(ok = result.is_ok(), "task finished");
                resolver.resolve(result);
            }
            .instrument(tracing::debug_span!("task", id)),
        );
        handle
    }
}
