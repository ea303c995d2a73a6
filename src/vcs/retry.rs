//! Exponential backoff for read-only repository queries.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::debug;

/// Configuration: 3 total attempts, base 500ms, max 5s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_MS: u64 = 500;
const MAX_INTERVAL_SECS: u64 = 5;

/// Retry an async operation while `should_retry` accepts its error.
///
/// `attempt` is called up to `MAX_ATTEMPTS` times. An error rejected by
/// `should_retry` is returned immediately; otherwise the task sleeps for an
/// exponentially increasing duration before the next attempt and the last
/// error is returned once attempts run out.
pub async fn retry_with_backoff<T, E, Fut, F, P>(mut attempt: F, should_retry: P) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: Duration::from_millis(INITIAL_INTERVAL_MS),
        max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        max_elapsed_time: None,
        ..Default::default()
    };

    let mut attempts = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if attempts >= MAX_ATTEMPTS || !should_retry(&e) => return Err(e),
            Err(_) => {
                attempts += 1;
                if let Some(wait_duration) = backoff.next_backoff() {
                    debug!(
                        "Retrying in {:?} (attempt {}/{})",
                        wait_duration, attempts, MAX_ATTEMPTS
                    );
                    tokio::time::sleep(wait_duration).await;
                }
            }
        }
    }
}
