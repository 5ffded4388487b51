//! HTTP policy shared by provider clients.
//!
//! Timeouts, retries and fan-out width live here, at the collaborator boundary,
//! so the fetch pipeline itself never sleeps or hangs.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};

use crate::error::EngineError;

const USER_AGENT: &str = concat!("sky-outlook/", env!("CARGO_PKG_VERSION"));

/// Timeout, retry and concurrency settings for provider requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HttpPolicy {
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry.
    pub backoff: Duration,
    /// Maximum in-flight per-year requests.
    pub max_concurrency: usize,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_retries: 2,
            backoff: Duration::from_millis(500),
            max_concurrency: 4,
        }
    }
}

impl HttpPolicy {
    /// Defaults overridden by `SKY_HTTP_TIMEOUT_SECS`, `SKY_HTTP_RETRIES`,
    /// `SKY_HTTP_BACKOFF_MS` and `SKY_FETCH_CONCURRENCY`.
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let mut policy = Self::default();
        if let Some(secs) = env_number::<u64>("SKY_HTTP_TIMEOUT_SECS")? {
            policy.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(retries) = env_number::<u32>("SKY_HTTP_RETRIES")? {
            policy.max_retries = retries;
        }
        if let Some(ms) = env_number::<u64>("SKY_HTTP_BACKOFF_MS")? {
            policy.backoff = Duration::from_millis(ms);
        }
        if let Some(n) = env_number::<usize>("SKY_FETCH_CONCURRENCY")? {
            policy.max_concurrency = n.max(1);
        }
        Ok(policy)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }

    pub fn build_client(&self) -> Result<Client, EngineError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EngineError::Request(format!("failed to build HTTP client: {e}")))
    }

    /// Send a request, retrying transport errors, 429 and 5xx with backoff.
    ///
    /// `build` is called once per attempt.
    pub fn send(&self, build: impl Fn() -> RequestBuilder) -> Result<Response, EngineError> {
        let mut attempt = 0u32;
        loop {
            let outcome = build().send();
            let retryable = match &outcome {
                Ok(resp) => is_retryable_status(resp.status()),
                Err(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            };

            if !retryable || attempt >= self.max_retries {
                return match outcome {
                    Ok(resp) if resp.status().is_success() => Ok(resp),
                    Ok(resp) => Err(EngineError::Request(format!(
                        "provider returned status {}",
                        resp.status()
                    ))),
                    Err(e) => Err(EngineError::Request(e.to_string())),
                };
            }

            attempt += 1;
            let delay = self.backoff_for(attempt);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying provider request");
            std::thread::sleep(delay);
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>, EngineError> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| EngineError::Config(format!("{key} must be a number (got '{raw}')"))),
        _ => Ok(None),
    }
}
