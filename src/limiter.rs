//! Bounded concurrency for fan-out fetches.
//!
//! Work is split into consecutive waves of at most `limit` futures; each
//! wave is joined before the next one starts. This caps in-flight requests
//! against the upstream API without spawning tasks, so borrowed state can be
//! shared with every future. Results come back in submission order.

use futures::future::join_all;
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveLimiter {
    limit: usize,
}

impl WaveLimiter {
    /// A zero limit is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every future, at most `limit` at a time, preserving input order.
    pub async fn run<I, F>(&self, work: I) -> Vec<F::Output>
    where
        I: IntoIterator<Item = F>,
        F: Future,
    {
        let mut pending = work.into_iter();
        let mut results = Vec::new();
        loop {
            let wave: Vec<F> = pending.by_ref().take(self.limit).collect();
            if wave.is_empty() {
                break;
            }
            results.extend(join_all(wave).await);
        }
        results
    }
}
