//! Chunked batch runs against the remote, with retry, throttling, and
//! serialized credential refresh wired together.
//!
//! Per chunk: an authorization failure asks the [`Session`] to refresh the
//! credential and retries; a connection, name-resolution or 429 failure shrinks
//! the queue's limiter and retries; anything else fails the chunk immediately.

mod report;

pub use report::{collect, BatchReport, ChunkOutcome};

use std::sync::Arc;

use crate::dispatch::{self, Chunk, ChunkTask, DispatchError, DEFAULT_CHUNK_SIZE};
use crate::limiter::{Limiter, LimiterPolicy};
use crate::remote::{ChunkCall, RemoteError};
use crate::retry::{self, Attempt, Backoff, ErrorKind, RetryError, RetryOptions};
use crate::session::{RefreshError, Session};
use crate::taskqueue::TaskQueue;

/// Why a single attempt at a chunk failed.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

/// Final error of a chunk task.
pub type ChunkFailure = RetryError<ChunkError>;

/// Handles returned by [`run_chunked`].
pub type BatchTasks<I, T> = Vec<ChunkTask<I, T, ChunkFailure>>;

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub chunk_size: usize,
    pub limiter: LimiterPolicy,
    /// Attempts per chunk, including the first.
    pub tries: u32,
    pub backoff: Option<Backoff>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            limiter: LimiterPolicy::default(),
            tries: 3,
            backoff: None,
        }
    }
}

impl BatchSettings {
    fn retry_options(&self) -> RetryOptions {
        let options = RetryOptions::new().tries(self.tries);
        match self.backoff {
            Some(b) => options.backoff(b),
            None => options,
        }
    }
}

/// Queue one retried `call` per chunk of `ids` on a fresh queue built from
/// `settings.limiter`. Drain the returned handles (e.g. with [`collect`]).
pub fn run_chunked<I, T, C>(
    session: Arc<Session>,
    call: Arc<C>,
    ids: Vec<I>,
    settings: &BatchSettings,
) -> Result<BatchTasks<I, T>, DispatchError>
where
    I: Send + Sync + 'static,
    T: Send + Sync + 'static,
    C: ChunkCall<I, T> + ?Sized + 'static,
{
    let queue = TaskQueue::with_policy(settings.limiter);
    run_chunked_on(&queue, session, call, ids, settings)
}

/// Like [`run_chunked`], on a caller-owned queue. `settings.limiter` is ignored;
/// the queue's limiter paces and throttles the batch.
pub fn run_chunked_on<I, T, C>(
    queue: &TaskQueue,
    session: Arc<Session>,
    call: Arc<C>,
    ids: Vec<I>,
    settings: &BatchSettings,
) -> Result<BatchTasks<I, T>, DispatchError>
where
    I: Send + Sync + 'static,
    T: Send + Sync + 'static,
    C: ChunkCall<I, T> + ?Sized + 'static,
{
    let options = settings
        .retry_options()
        .pause(session.pause_controller().clone())
        .limiter(queue.limiter().clone());

    dispatch::dispatch(queue, ids, settings.chunk_size, |chunk| {
        let session = Arc::clone(&session);
        let call = Arc::clone(&call);
        let limiter = queue.limiter().clone();
        let options = options.clone();
        async move {
            let (session, call, limiter, chunk) = (&*session, &*call, &limiter, &chunk);
            retry::run(&options, move |attempt| {
                attempt_chunk(session, call, limiter, chunk, attempt)
            })
            .await
        }
    })
}

async fn attempt_chunk<I, T, C>(
    session: &Session,
    call: &C,
    limiter: &Limiter,
    chunk: &Chunk<I>,
    attempt: u32,
) -> Result<T, Attempt<ChunkError>>
where
    I: Sync,
    C: ChunkCall<I, T> + ?Sized,
{
    let credential = session.credential().await;
    let err = match call.call(&credential.value, chunk.ids()).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match err.kind() {
        ErrorKind::Unauthorized => {
            tracing::debug!(chunk = chunk.index(), attempt, "credential rejected");
            match session.refresh(&credential, &err.to_string()).await {
                Ok(_) => Err(Attempt::Retryable(err.into())),
                Err(abandoned) => Err(Attempt::Terminal(abandoned.into())),
            }
        }
        kind if kind.throttles() => {
            tracing::debug!(chunk = chunk.index(), attempt, error = %err, "transient failure");
            limiter.decrement();
            Err(Attempt::Retryable(err.into()))
        }
        _ => Err(Attempt::Terminal(err.into())),
    }
}
