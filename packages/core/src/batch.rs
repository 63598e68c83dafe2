//! Ordered fan-out: start one task per item, wait for all of them, and hand
//! back the results in item order regardless of completion order.

use futures::future::join_all;
use std::future::Future;

/// Run `task` for every item concurrently. The barrier waits for every
/// task; a slow first task does not let later results overtake it in the
/// returned vector.
pub async fn fan_out<T, U, F, Fut>(items: impl IntoIterator<Item = T>, task: F) -> Vec<U>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = U>,
{
    join_all(items.into_iter().map(task)).await
}
