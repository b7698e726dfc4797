use crate::error::Result;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!(
    "docmirror/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/trapdoorsec/docmirror)"
);

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Statuses worth another attempt: rate limiting and transient gateway errors.
const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// GET-only HTTP client shared by the page fetcher and the asset mirror.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Self::builder(DEFAULT_USER_AGENT, timeout_secs, RetryPolicy::default())
    }

    pub fn builder(user_agent: &str, timeout_secs: u64, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .gzip(true)
            .build()?;

        Ok(Self { client, retry })
    }

    /// Send a GET, retrying transient failures.
    ///
    /// When retries run out on a retryable status the last response is
    /// returned so callers can still report the status.
    pub async fn get(&self, url: &Url) -> Result<Response> {
        let mut attempt = 0;

        loop {
            debug!("GET {} (attempt {})", url, attempt + 1);
            let outcome = self.client.get(url.clone()).send().await;
            let can_retry = attempt < self.retry.max_retries;

            match outcome {
                Ok(response) if can_retry && RETRY_STATUSES.contains(&response.status()) => {
                    warn!("{} answered {}, retrying", url, response.status());
                }
                Ok(response) => return Ok(response),
                Err(e) if can_retry && (e.is_connect() || e.is_timeout()) => {
                    warn!("Request to {} failed ({}), retrying", url, e);
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(self.retry.delay_for(attempt)).await;
            attempt += 1;
        }
    }
}
