//! Chunk dispatcher: one queued task per fixed-size slice of the input.
//!
//! Handles come back in chunk order, not completion order, so callers can
//! reassemble output deterministically. A failing chunk never cancels its
//! siblings.

mod chunk;

pub use chunk::{chunk_count, chunk_ranges, Chunk};

use std::future::Future;
use std::sync::Arc;

use crate::taskqueue::{TaskHandle, TaskQueue, TaskResult};

/// Default number of ids per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
}

/// A dispatched chunk and the handle to its result.
#[derive(Debug)]
pub struct ChunkTask<I, T, E> {
    pub chunk: Chunk<I>,
    pub handle: TaskHandle<T, E>,
}

/// Split `items` into chunks of at most `chunk_size`, queue `make_task(chunk)`
/// for each, and return the tasks in chunk order.
pub fn dispatch<I, T, E, F, Fut>(
    queue: &TaskQueue,
    items: Vec<I>,
    chunk_size: usize,
    mut make_task: F,
) -> Result<Vec<ChunkTask<I, T, E>>, DispatchError>
where
    I: Send + Sync + 'static,
    F: FnMut(Chunk<I>) -> Fut,
    Fut: Future<Output = TaskResult<T, E>> + Send + 'static,
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    if chunk_size == 0 {
        return Err(DispatchError::ZeroChunkSize);
    }
    let items: Arc<[I]> = items.into();
    let mut tasks = Vec::with_capacity(chunk_count(items.len(), chunk_size));

    for (index, range) in chunk_ranges(items.len(), chunk_size).enumerate() {
        let chunk = Chunk::new(index, range, Arc::clone(&items));
        let body = make_task(chunk.clone());
        let handle = queue.queue_task(move || body);
        tasks.push(ChunkTask { chunk, handle });
    }

    tracing::debug!(
        items = items.len(),
        chunk_size,
        chunks = tasks.len(),
        "dispatched chunks"
    );
    Ok(tasks)
}
