//! Timeouts and retries around external calls.

use std::future::Future;
use std::time::Duration;
use troubleshooter_core::{AppError, AppResult};

/// Initial backoff between read retries in milliseconds
const INITIAL_BACKOFF_MS: u64 = 100;

/// Run `fut` with a time budget. Expiry becomes [`AppError::Timeout`].
pub async fn with_timeout<T, F>(operation: &str, budget: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout {
            operation: operation.to_string(),
            secs: budget.as_secs(),
        }),
    }
}

/// Run an idempotent read, retrying up to `retries` extra times with
/// exponential backoff. Each attempt gets the full time budget.
pub async fn retry_read<T, F, Fut>(
    operation: &str,
    budget: Duration,
    retries: u32,
    mut call: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    loop {
        match with_timeout(operation, budget, call()).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                attempt += 1;
                let backoff_ms = backoff_ms(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {}ms: {}",
                    operation,
                    attempt,
                    retries + 1,
                    backoff_ms,
                    e
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Delay before retry `attempt` (1-based); saturates instead of overflowing.
fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS.saturating_mul(2_u64.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_growth_and_saturation() {
        assert_eq!(backoff_ms(1), 200);
        assert_eq!(backoff_ms(3), 800);
        assert_eq!(backoff_ms(58), u64::MAX);
        assert_eq!(backoff_ms(u32::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let result: AppResult<()> = with_timeout("slow call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let calls = AtomicU32::new(0);
        let result = retry_read("flaky read", Duration::from_secs(1), 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AppError::Store("busy".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = retry_read("dead read", Duration::from_secs(1), 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Store("down".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
