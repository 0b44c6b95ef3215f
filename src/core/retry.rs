use crate::domain::ports::{ApiError, ApiResult};
use std::future::Future;
use std::time::Duration;

/// Re-issues `op` on transport failure, up to `max_attempts` additional
/// times with `delay` between attempts. A structured non-2xx response is
/// never retried: it passes straight through to the caller. After the
/// attempts are exhausted the last transport failure is surfaced.
///
/// Panics if `max_attempts` is zero; that is a programming error, not a
/// runtime condition.
pub async fn with_bounded_retry<T, F, Fut>(op: F, max_attempts: u32, delay: Duration) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    assert!(max_attempts > 0, "max_attempts must be positive");

    let mut retries = 0;
    loop {
        match op().await {
            Err(err @ ApiError::Transport(_)) if retries < max_attempts => {
                retries += 1;
                tracing::debug!("transport failure, retrying ({}/{}): {}", retries, max_attempts, err);
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

/// Re-issues `op` with `delay` between attempts until it succeeds with a
/// body for which `should_retry` returns false. Failures of any kind are
/// treated as transient and retried; there is no attempt cap.
///
/// Meant for polling an idempotent resource toward a terminal state. The
/// only way out besides a satisfying body is cancellation: dropping the
/// returned future (e.g. losing a `select!`) abandons the in-flight call
/// and delivers nothing.
pub async fn with_condition_retry<T, F, Fut, P>(op: F, should_retry: P, delay: Duration) -> T
where
    F: Fn() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
    P: Fn(&T) -> bool,
{
    loop {
        match op().await {
            Ok(body) => {
                if !should_retry(&body) {
                    return body;
                }
                tracing::debug!("condition not met, polling again");
            }
            Err(err) => {
                tracing::debug!("poll attempt failed, retrying: {}", err);
            }
        }
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transport_error() -> ApiError {
        ApiError::Transport(Box::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }

    /// Fails with transport errors for the first `failures` calls, then
    /// succeeds with the call count.
    fn flaky_op(
        failures: u32,
    ) -> (Arc<AtomicU32>, impl Fn() -> std::future::Ready<ApiResult<u32>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n <= failures {
                Err(transport_error())
            } else {
                Ok(n)
            })
        };
        (calls, op)
    }

    #[tokio::test]
    async fn test_bounded_retry_recovers_within_attempts() {
        let (calls, op) = flaky_op(3);
        let result = with_bounded_retry(op, 3, Duration::ZERO).await.unwrap();
        assert_eq!(result, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_bounded_retry_exhausts_attempts() {
        let (calls, op) = flaky_op(3);
        let err = with_bounded_retry(op, 2, Duration::ZERO).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_bounded_retry_passes_status_errors_through() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err::<u32, _>(ApiError::Status {
                status: 422,
                body: "{\"error\":\"invalid\"}".to_string(),
            }))
        };

        let err = with_bounded_retry(op, 5, Duration::ZERO).await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("invalid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Structured responses get a single attempt.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_retry_succeeds_first_try() {
        let (calls, op) = flaky_op(0);
        let result = with_bounded_retry(op, 4, Duration::ZERO).await.unwrap();
        assert_eq!(result, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[should_panic(expected = "max_attempts must be positive")]
    async fn test_bounded_retry_rejects_zero_attempts() {
        let (_, op) = flaky_op(0);
        let _ = with_bounded_retry(op, 0, Duration::ZERO).await;
    }

    #[tokio::test]
    async fn test_condition_retry_polls_until_condition_clears() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok::<u32, ApiError>(n))
        };

        let result = with_condition_retry(op, |n| *n < 5, Duration::ZERO).await;
        assert_eq!(result, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_condition_retry_retries_failures_without_cap() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(match n {
                1..=10 => Err(transport_error()),
                11 => Err(ApiError::Status {
                    status: 503,
                    body: String::new(),
                }),
                _ => Ok(n),
            })
        };

        let result = with_condition_retry(op, |_| false, Duration::ZERO).await;
        assert_eq!(result, 12);
    }

    #[tokio::test]
    async fn test_condition_retry_dropped_future_delivers_nothing() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let op = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<u32, ApiError>(0))
        };

        let poll = with_condition_retry(op, |_| true, Duration::from_secs(60));
        tokio::select! {
            _ = poll => panic!("poll should never complete"),
            _ = tokio::task::yield_now() => {}
        }
        // The dropped poll made its first call and nothing more.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_retries_do_not_share_counters() {
        let (calls_a, op_a) = flaky_op(2);
        let (calls_b, op_b) = flaky_op(4);

        let (a, b) = tokio::join!(
            with_bounded_retry(op_a, 4, Duration::ZERO),
            with_bounded_retry(op_b, 4, Duration::ZERO),
        );

        assert_eq!(a.unwrap(), 3);
        assert_eq!(b.unwrap(), 5);
        assert_eq!(calls_a.load(Ordering::SeqCst), 3);
        assert_eq!(calls_b.load(Ordering::SeqCst), 5);
    }
}
