//! Per-call time limits for store and cache calls

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::DomainError;

/// Await `future`, failing with `DomainError::Timeout` once `limit` elapses
pub async fn with_deadline<T, F>(
    operation: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, limit_ms = limit.as_millis() as u64, "Call timed out");
            Err(DomainError::timeout(operation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_completes_within_limit() {
        let result = with_deadline("fast", Duration::from_secs(1), async { Ok(7) }).await;

        assert_eq!(assert_ok!(result), 7);
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<(), _> = with_deadline("failing", Duration::from_secs(1), async {
            Err(DomainError::storage("down"))
        })
        .await;

        let err = assert_err!(result);
        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: Result<(), _> = with_deadline("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DomainError::Timeout { ref operation }) if operation == "slow"));
    }
}
