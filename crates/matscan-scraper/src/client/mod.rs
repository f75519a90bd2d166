//! Outbound HTTP: the [`HttpFetcher`] seam and its `reqwest` implementation.
//!
//! The orchestrator only ever talks to `HttpFetcher`, so tests can drive the
//! whole pipeline against canned bodies. Status handling and the single
//! retry live in [`fetch_checked`], outside the trait, so every fetcher gets
//! the same policy.

mod origin;

use std::future::Future;
use std::time::Duration;

use matscan_core::{AppConfig, FetchMethod};
use reqwest::Client;
use tokio::time::Instant;

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::{FetchResponse, FetchSpec};

pub use origin::extract_origin;
#[cfg(test)]
use origin::extract_domain;

/// `Retry-After` assumed when a 429 response does not carry one.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Fetches one [`FetchSpec`] within `timeout`.
///
/// Implementations report the raw status and body; non-2xx statuses are not
/// errors at this layer. All implementations must be `Send + Sync` because
/// one fetcher is shared read-only by every supplier task.
pub trait HttpFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Timeout`] when `timeout` elapses and
    /// [`ScraperError::Http`] on transport failure.
    fn fetch(
        &self,
        spec: &FetchSpec,
        timeout: Duration,
    ) -> impl Future<Output = Result<FetchResponse, ScraperError>> + Send;
}

/// Retry settings applied to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; at most one.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_ms,
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

/// [`HttpFetcher`] backed by a shared `reqwest::Client` with a browser-like
/// request profile.
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Creates a fetcher with a process-wide request ceiling, connect
    /// timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        request_timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// # Errors
    ///
    /// See [`ReqwestFetcher::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.request_timeout_secs,
            config.connect_timeout_secs,
            &config.user_agent,
        )
    }
}

impl HttpFetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        spec: &FetchSpec,
        timeout: Duration,
    ) -> Result<FetchResponse, ScraperError> {
        let request = match spec.method {
            FetchMethod::Get => self.client.get(&spec.url),
            FetchMethod::Post => self.client.post(&spec.url).form(&spec.form),
        };

        let response = request
            .timeout(timeout)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-GB,en;q=0.9")
            .header(reqwest::header::REFERER, extract_origin(&spec.url))
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| map_transport_error(e, &spec.url, timeout))?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, &spec.url, timeout))?;

        Ok(FetchResponse {
            status,
            body,
            url,
            retry_after_secs,
        })
    }
}

fn map_transport_error(err: reqwest::Error, url: &str, timeout: Duration) -> ScraperError {
    if err.is_timeout() {
        ScraperError::Timeout {
            url: url.to_owned(),
            after_ms: duration_ms(timeout),
        }
    } else {
        ScraperError::Http(err)
    }
}

/// Fetches `spec` with status checking and at most `policy.max_retries`
/// retries, never running past `deadline`.
///
/// Each attempt's timeout is the time left before `deadline`, clipped to
/// `ceiling`.
///
/// # Errors
///
/// - [`ScraperError::Timeout`] when the deadline passes.
/// - [`ScraperError::RateLimited`] for HTTP 429, never retried.
/// - [`ScraperError::UnexpectedStatus`] for any other non-2xx status
///   (5xx retried, 4xx not).
/// - [`ScraperError::Http`] on transport failure after retries.
pub async fn fetch_checked<F: HttpFetcher>(
    fetcher: &F,
    spec: &FetchSpec,
    deadline: Instant,
    ceiling: Duration,
    policy: RetryPolicy,
) -> Result<FetchResponse, ScraperError> {
    retry_with_backoff(policy.max_retries, policy.backoff_base_ms, move || async move {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ScraperError::Timeout {
                url: spec.url.clone(),
                after_ms: 0,
            });
        }
        let response = fetcher.fetch(spec, remaining.min(ceiling)).await?;
        check_status(response)
    })
    .await
}

/// Maps a non-2xx [`FetchResponse`] to its typed error.
fn check_status(response: FetchResponse) -> Result<FetchResponse, ScraperError> {
    match response.status {
        200..=299 => Ok(response),
        429 => Err(ScraperError::RateLimited {
            domain: origin::extract_domain(&response.url),
            retry_after_secs: response
                .retry_after_secs
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        }),
        status => Err(ScraperError::UnexpectedStatus {
            status,
            url: response.url,
        }),
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
