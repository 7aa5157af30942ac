//! Contiguous chunk views over a shared id collection.

use std::ops::{Deref, Range};
use std::sync::Arc;

/// Split `0..len` into contiguous ranges of at most `size` (the last may be shorter).
/// A zero `size` is treated as one.
pub fn chunk_ranges(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(move |start| start..(start + size).min(len))
}

/// Number of chunks for `len` items at `size` per chunk.
pub fn chunk_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}

/// A view into the shared id list; cloning does not copy the ids.
#[derive(Debug)]
pub struct Chunk<I> {
    index: usize,
    range: Range<usize>,
    items: Arc<[I]>,
}

impl<I> Chunk<I> {
    pub(super) fn new(index: usize, range: Range<usize>, items: Arc<[I]>) -> Self {
        Self { index, range, items }
    }

    /// Position of this chunk in dispatch order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Offsets of this chunk within the full collection.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub fn ids(&self) -> &[I] {
        &self.items[self.range.clone()]
    }
}

impl<I> Deref for Chunk<I> {
    type Target = [I];

    fn deref(&self) -> &[I] {
        self.ids()
    }
}

impl<I> Clone for Chunk<I> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            range: self.range.clone(),
            items: Arc::clone(&self.items),
        }
    }
}
