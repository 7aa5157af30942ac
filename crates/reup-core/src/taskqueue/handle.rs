//! Single-assignment, multi-read result cell for one queued task.

use std::sync::Arc;
use tokio::sync::watch;

/// Outcome of one task body.
pub type TaskResult<T, E> = Result<T, E>;

type Slot<T, E> = Option<Arc<TaskResult<T, E>>>;

/// The task ended without delivering a result (its body panicked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task {id} ended without delivering a result")]
pub struct TaskLost {
    pub id: u64,
}

/// Handle to a queued task's eventual result. Cloning yields another reader of
/// the same cell; the value stays available after it has been read.
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    id: u64,
    rx: watch::Receiver<Slot<T, E>>,
}

/// Write side, owned by the spawned task. Consumed on delivery.
pub(super) struct Resolver<T, E> {
    tx: watch::Sender<Slot<T, E>>,
}

pub(super) fn cell<T, E>(id: u64) -> (Resolver<T, E>, TaskHandle<T, E>) {
    let (tx, rx) = watch::channel(None);
    (Resolver { tx }, TaskHandle { id, rx })
}

impl<T, E> Resolver<T, E> {
    pub(super) fn resolve(self, result: TaskResult<T, E>) {
        self.tx.send_replace(Some(Arc::new(result)));
    }
}

impl<T, E> TaskHandle<T, E> {
    /// Queue-assigned task id (matches the `task` tracing span).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the result. Can be called any number of times.
    pub async fn wait(&self) -> Result<Arc<TaskResult<T, E>>, TaskLost> {
        let mut rx = self.rx.clone();
        let slot = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| TaskLost { id: self.id })?;
        let result = slot.as_ref().map(Arc::clone);
        result.ok_or(TaskLost { id: self.id })
    }

    /// The result if already delivered.
    pub fn try_get(&self) -> Option<Arc<TaskResult<T, E>>> {
        self.rx.borrow().as_ref().map(Arc::clone)
    }

    pub fn is_finished(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

impl<T, E> Clone for TaskHandle<T, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            rx: self.rx.clone(),
        }
    }
}
