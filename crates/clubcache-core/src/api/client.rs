//! Shared HTTP plumbing for the Google REST APIs.
//!
//! Both the Drive and Calendar clients go through `ApiClient`, which owns the
//! connection pool, the API key, the request timeout and the retry policy.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for transient failures (429, 5xx, transport).
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on any single backoff delay.
const MAX_BACKOFF_MS: u64 = 8_000;

/// Exponential backoff with jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// No retries, used by tests and one-shot CLI commands.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): doubles each time,
    /// capped, plus up to 25% random jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let base = self
            .initial_backoff
            .saturating_mul(1u32 << exp)
            .min(self.max_backoff);
        let jitter_ms = base.as_millis() as u64 / 4;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        base + Duration::from_millis(jitter)
    }
}

/// API client for the Google REST endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_key: Arc<String>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new API client authenticated with an API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: Arc::new(api_key.into()),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send_once(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, ApiError> {
        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;
        Self::check_response(response).await
    }

    /// GET with retries on transient failures.
    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response, ApiError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url, query).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url = url,
                        retry = attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let response = self.send(url, query).await?;
        let text = response.text().await?;
        debug!(url = url, bytes = text.len(), "Response received");
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let response = self.send(url, query).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_with_bounded_jitter() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(10_000),
        };
        for (attempt, base) in [(1, 100u64), (2, 200), (3, 400)] {
            let delay = policy.delay_for(attempt).as_millis() as u64;
            assert!(delay >= base, "attempt {} delay {} < {}", attempt, delay, base);
            assert!(delay <= base + base / 4, "attempt {} delay {} too large", attempt, delay);
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(2_000),
        };
        let delay = policy.delay_for(8).as_millis() as u64;
        assert!(delay <= 2_500);
    }

    #[test]
    fn test_no_retry_policy() {
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}
