use std::ops::Range;

use serde::Serialize;

pub const INITIAL_BATCH: usize = 24;
pub const SUBSEQUENT_BATCH: usize = 12;

/// Incremental loading over a filtered result list of `total` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    total: usize,
    loaded: usize,
}

/// One step of [`Pagination::next_batch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub range: Range<usize>,
    pub has_more: bool,
    pub loaded: usize,
    pub total: usize,
}

impl Pagination {
    pub fn new(total: usize) -> Self {
        Self { total, loaded: 0 }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn has_more(&self) -> bool {
        self.loaded < self.total
    }

    /// Advance by one batch: [`INITIAL_BATCH`] items the first time,
    /// [`SUBSEQUENT_BATCH`] afterwards. Returns an empty range once
    /// everything is loaded.
    pub fn next_batch(&mut self) -> Batch {
        let size = if self.loaded == 0 {
            INITIAL_BATCH
        } else {
            SUBSEQUENT_BATCH
        };
        let start = self.loaded;
        let end = (start + size).min(self.total);
        self.loaded = end;

        Batch {
            range: start..end,
            has_more: self.has_more(),
            loaded: end,
            total: self.total,
        }
    }

    /// Everything loaded so far.
    pub fn loaded_range(&self) -> Range<usize> {
        0..self.loaded
    }

    pub fn reset(&mut self, total: usize) {
        *self = Self::new(total);
    }
}
