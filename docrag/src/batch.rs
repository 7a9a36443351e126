//! Bounded-batch writer: submits records in fixed-size batches.
//!
//! Batching exists purely for resource and backpressure reasons; it must
//! not change ordering or result semantics versus a single unbatched
//! write. The utility is independent of any particular store client so the
//! batching behavior is testable in isolation.

use std::future::Future;

use docrag_core::Result;

/// Writes a slice of records through an async sink in fixed-size batches,
/// preserving input order. The first failing batch aborts the write and
/// returns its error.
pub struct BatchWriter {
    batch_size: usize,
}

impl BatchWriter {
    /// Create a writer with the given batch size. A size of zero is
    /// normalized to one.
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size: batch_size.max(1) }
    }

    /// Submit `records` to `write` in order, `batch_size` at a time.
    ///
    /// Batches are handed over owned: the futures `write` returns borrow
    /// nothing from its captures, so callers' futures stay `Send` and can
    /// be spawned onto a multithreaded runtime.
    pub async fn write_all<T, F, Fut>(&self, records: &[T], mut write: F) -> Result<()>
    where
        T: Clone,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        for batch in records.chunks(self.batch_size) {
            write(batch.to_vec()).await?;
        }
        Ok(())
    }
}
