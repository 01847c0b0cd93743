//! Bounded retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

const BASE_DELAY_MS: u64 = 200;
const JITTER_MS: i64 = 150;

/// Run `operation` up to `max_attempts` times. Delays double from 200ms and
/// get up to ±150ms of jitter so concurrent retriers fan out instead of
/// thundering together. The last error is returned when every attempt
/// fails.
pub async fn retry_with_backoff<T, E, F, Fut>(
    label: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(label, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(label, attempt, error = %e, "Operation failed, giving up");
                return Err(e);
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let base = BASE_DELAY_MS.saturating_mul(1u64 << (attempt - 1).min(16)) as i64;
    let jitter = rand::rng().random_range(-JITTER_MS..=JITTER_MS);
    Duration::from_millis(base.saturating_add(jitter).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_attempt_without_sleeping() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = retry_with_backoff("test", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, String> = retry_with_backoff("test", 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_with_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff("test", 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(format!("failure {n}")) }
        })
        .await;
        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delays_double_and_stay_within_jitter_bounds() {
        for attempt in 1..=3u32 {
            let base = (BASE_DELAY_MS << (attempt - 1)) as i64;
            let delay = backoff_delay(attempt).as_millis() as i64;
            assert!(
                (delay - base).abs() <= JITTER_MS,
                "attempt {}: delay {} outside {}±{}",
                attempt,
                delay,
                base,
                JITTER_MS
            );
        }
    }
}
