//! Opt-in retry and timeout helpers for flaky operations.

use std::{fmt::Display, future::Future, time::Duration};

use tracing::warn;

use crate::Error;

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

/// Delay before the next attempt after failed attempt number `attempt` (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Run `operation` up to `max_attempts` times with exponential backoff.
///
/// After failed attempt `n` the helper waits [`backoff_delay(n)`](backoff_delay)
/// (2s, 4s, 8s, ...) before trying again. Once every attempt has failed the
/// last error is returned. A `max_attempts` of zero is treated as one.
pub async fn with_retry<T, E, F, Fut>(mut operation: F, max_attempts: u32) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                let delay = backoff_delay(attempt);
                warn!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt {}/{} failed, retrying",
                    attempt,
                    max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Race `future` against a timer of length `timeout`.
///
/// # Errors
///
/// Returns [`Error::Timeout`] when the timer fires first. The future is
/// dropped in that case.
pub async fn with_timeout<F>(future: F, timeout: Duration) -> Result<F::Output, Error>
where
    F: Future,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| Error::Timeout { timeout })
}
