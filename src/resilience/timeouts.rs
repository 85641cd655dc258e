//! Optional deadlines around external calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

/// Run `fut`, bounded by `limit` when one is set.
///
/// Returns `Err(limit)` when the deadline passed first.
pub async fn with_optional_timeout<F>(limit: Option<Duration>, fut: F) -> Result<F::Output, Duration>
where
    F: Future,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| limit),
        None => Ok(fut.await),
    }
}
