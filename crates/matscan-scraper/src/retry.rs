//! Retry with back-off and jitter for supplier fetches.
//!
//! A fetch is retried only on transient conditions: transport failure and
//! HTTP 5xx. Everything else (4xx including 429, parse failures, deadline
//! expiry) is returned immediately. A 429's `Retry-After` is usually far
//! longer than a supplier's whole budget, so it is reported, not waited on. An empty but successful page is never
//! retried; that decision belongs to the caller, which sees `Ok`.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Ceiling on a single back-off sleep.
const MAX_DELAY_MS: u64 = 5_000;

/// Returns `true` for errors worth one more attempt.
///
/// [`ScraperError::Timeout`] is not retriable: the per-request timeout is
/// already clipped to the supplier's remaining budget, so a second attempt
/// would start with nothing left.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::Http(e) => !e.is_timeout() && (e.is_connect() || e.is_request() || e.is_body()),
        ScraperError::RateLimited { .. }
        | ScraperError::Timeout { .. }
        | ScraperError::Parse { .. }
        | ScraperError::InvalidSelector { .. }
        | ScraperError::InvalidUrl { .. }
        | ScraperError::Config(_) => false,
    }
}

/// Runs `operation`, retrying up to `max_retries` more times on transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 %
/// jitter, capped at 5 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient fetch error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://example.com/search?q=pir".to_owned(),
        }
    }

    #[test]
    fn server_errors_are_retriable() {
        assert!(is_retriable(&server_error()));
    }

    #[test]
    fn rate_limits_are_not_retriable() {
        assert!(!is_retriable(&ScraperError::RateLimited {
            domain: "example.com".to_owned(),
            retry_after_secs: 1,
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&ScraperError::UnexpectedStatus {
            status: 404,
            url: "https://example.com/missing".to_owned(),
        }));
        assert!(!is_retriable(&ScraperError::UnexpectedStatus {
            status: 403,
            url: "https://example.com/blocked".to_owned(),
        }));
    }

    #[test]
    fn timeouts_and_parse_errors_are_not_retriable() {
        assert!(!is_retriable(&ScraperError::Timeout {
            url: "https://example.com".to_owned(),
            after_ms: 10,
        }));
        assert!(!is_retriable(&ScraperError::parse("body", "bad json")));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_once_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(server_error())
                } else {
                    Ok::<u32, ScraperError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_single_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::UnexpectedStatus {
                    status: 404,
                    url: "https://example.com/search".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let _ = retry_with_backoff(0, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(server_error())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
