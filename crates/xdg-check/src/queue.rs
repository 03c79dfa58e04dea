//! Single-worker job queue.
//!
//! Jobs run one at a time in submission order; results come back in the same
//! order. The next job's future is not created until the previous one has
//! finished, so status updates and annotations from different files never
//! interleave.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Queue with exactly one worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialQueue;

impl SequentialQueue {
    /// Jobs allowed in flight at once.
    pub const WORKERS: usize = 1;

    pub fn new() -> Self {
        SequentialQueue
    }

    /// Run `job` over `items` and collect the outputs in order.
    pub async fn run<I, T, F, Fut>(&self, items: I, job: F) -> Vec<Fut::Output>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Fut,
        Fut: Future,
    {
        stream::iter(items)
            .map(job)
            .buffered(Self::WORKERS)
            .collect()
            .await
    }
}
