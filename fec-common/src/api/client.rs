//! FEC API client
//!
//! Sequential, rate-limited access to `api.open.fec.gov`. Every request waits
//! out a per-endpoint-cost delay first; HTTP 429 and timeouts are retried with
//! capped exponential backoff. Nothing here issues concurrent requests.

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

use super::types::Envelope;
use crate::config::ApiKey;

const USER_AGENT: &str = concat!("fec-pipeline/", env!("CARGO_PKG_VERSION"));
const ERROR_BODY_LIMIT: usize = 400;

/// FEC client errors
#[derive(Debug, Error)]
pub enum FecError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl FecError {
    /// Worth retrying after a backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, FecError::RateLimited | FecError::Timeout(_))
    }
}

/// Relative cost of an endpoint, selects the pre-request delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointCost {
    /// Detail lookups, listings, aggregates
    Listing,
    /// Itemized schedule walks (Schedule A/B/E)
    Itemized,
}

/// Delays, retry budget and timeout for every request
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    pub listing_delay: Duration,
    pub itemized_delay: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub timeout: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            listing_delay: Duration::from_millis(250),
            itemized_delay: Duration::from_millis(1200),
            max_retries: 5,
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RequestPolicy {
    pub fn delay_for(&self, cost: EndpointCost) -> Duration {
        match cost {
            EndpointCost::Listing => self.listing_delay,
            EndpointCost::Itemized => self.itemized_delay,
        }
    }

    /// Wait before retry number `attempt` (0-based): `min(base * 2^attempt, max)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_max)
            .min(self.backoff_max)
    }
}

/// Enforces a minimum gap between consecutive requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new() -> Self {
        Self {
            last_request: Mutex::new(None),
        }
    }

    async fn wait(&self, min_interval: Duration) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < min_interval {
                let wait_time = min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// FEC API client
pub struct FecClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
    policy: RequestPolicy,
    rate_limiter: Arc<RateLimiter>,
}

impl FecClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKey,
        policy: RequestPolicy,
    ) -> Result<Self, FecError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(policy.timeout)
            .build()
            .map_err(|e| FecError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            policy,
            rate_limiter: Arc::new(RateLimiter::new()),
        })
    }

    pub fn policy(&self) -> &RequestPolicy {
        &self.policy
    }

    /// GET one page, retrying transient failures
    ///
    /// `path` is relative to the API base (e.g. `/committee/C00000001/reports/`).
    pub async fn get(
        &self,
        path: &str,
        params: &[(String, String)],
        cost: EndpointCost,
    ) -> Result<Envelope, FecError> {
        let mut attempt = 0u32;
        loop {
            self.rate_limiter.wait(self.policy.delay_for(cost)).await;

            match self.send_once(path, params).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let wait = self.policy.backoff(attempt);
                    tracing::warn!(
                        path = %path,
                        retry = attempt + 1,
                        max_retries = self.policy.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Transient FEC error, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(FecError::RetriesExhausted {
                        attempts: attempt + 1,
                        last: e.to_string(),
                    });
                }
                other => return other,
            }
        }
    }

    async fn send_once(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Envelope, FecError> {
        let url = format!("{}{}", self.base_url, path);

        tracing::debug!(path = %path, params = params.len(), "Querying FEC API");

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(params)
            .query(&[("api_key", self.api_key.expose())])
            .send()
            .await
            .map_err(|e| {
                // The URL carries the API key; never let it into messages
                if e.is_timeout() {
                    FecError::Timeout(path.to_string())
                } else {
                    FecError::NetworkError(e.without_url().to_string())
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FecError::RateLimited);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FecError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let mut error_text = response.text().await.unwrap_or_default();
            if error_text.len() > ERROR_BODY_LIMIT {
                let cut = (0..=ERROR_BODY_LIMIT)
                    .rev()
                    .find(|i| error_text.is_char_boundary(*i))
                    .unwrap_or(0);
                error_text.truncate(cut);
            }
            return Err(FecError::ApiError(status.as_u16(), error_text));
        }

        response
            .json::<Envelope>()
            .await
            .map_err(|e| FecError::ParseError(e.without_url().to_string()))
    }
}
