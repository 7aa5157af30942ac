//! Draining chunk handles into a per-chunk report.

use std::sync::Arc;

use crate::dispatch::{Chunk, ChunkTask};
use crate::taskqueue::{TaskLost, TaskResult};

/// Result of one chunk, kept next to the ids it covered.
#[derive(Debug)]
pub struct ChunkOutcome<I, T, E> {
    pub chunk: Chunk<I>,
    pub result: Arc<TaskResult<T, E>>,
}

/// Every chunk of a batch, in chunk order.
#[derive(Debug)]
pub struct BatchReport<I, T, E> {
    pub outcomes: Vec<ChunkOutcome<I, T, E>>,
}

impl<I, T, E> BatchReport<I, T, E> {
    pub fn successes(&self) -> impl Iterator<Item = (&Chunk<I>, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().as_ref().ok().map(|v| (&o.chunk, v)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Chunk<I>, &E)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().as_ref().err().map(|e| (&o.chunk, e)))
    }

    /// Total ids across all chunks.
    pub fn item_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.chunk.len()).sum()
    }

    /// Ids covered by failed chunks.
    pub fn failed_item_count(&self) -> usize {
        self.failures().map(|(c, _)| c.len()).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Wait for every task in order. A lost task (panicked body) aborts collection.
pub async fn collect<I, T, E>(tasks: Vec<ChunkTask<I, T, E>>) -> Result<BatchReport<I, T, E>, TaskLost> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        let result = task.handle.wait().await?;
        outcomes.push(ChunkOutcome {
            chunk: task.chunk,
            result,
        });
    }
    Ok(BatchReport { outcomes })
}
