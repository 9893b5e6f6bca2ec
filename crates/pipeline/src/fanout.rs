//! Bounded concurrent fan-out used by every phase.

use std::future::Future;

use futures::stream::{self, StreamExt};

/// Run `op` over every item with at most `limit` futures in flight and
/// wait for all of them to settle.
///
/// Results come back in completion order, so `op` should return
/// whatever identifies its item (the task index). A `limit` of zero is
/// treated as one.
pub async fn bounded<I, F, Fut, T>(items: I, limit: usize, op: F) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(op)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}
