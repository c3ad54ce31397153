//! Client configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Explicit builder setters
//! 2. Environment variables (PIPEWATCH_URL, PIPEWATCH_TOKEN,
//!    PIPEWATCH_TIMEOUT_SECS, PIPEWATCH_MAX_RETRIES)
//! 3. Defaults (30s timeout, 3 attempts)

use std::time::Duration;

use crate::core::RetryPolicy;
use crate::error::{Error, Result};

/// Configuration for a [`WatchClient`](crate::WatchClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the watch service.
    pub base_url: String,

    /// Opaque bearer token attached to every request. How it is obtained
    /// is the caller's concern.
    pub bearer_token: Option<String>,

    /// Per-attempt request timeout.
    pub timeout: Duration,

    /// Process-wide default retry policy; overridable per call.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a configuration from `PIPEWATCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("PIPEWATCH_URL")
            .map_err(|_| Error::invalid_usage("PIPEWATCH_URL is not set"))?;

        let mut config = Self::new(base_url);

        if let Ok(token) = std::env::var("PIPEWATCH_TOKEN") {
            config.bearer_token = Some(token);
        }

        if let Ok(secs) = std::env::var("PIPEWATCH_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::invalid_usage("PIPEWATCH_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(attempts) = std::env::var("PIPEWATCH_MAX_RETRIES") {
            config.retry.max_attempts = attempts.parse().map_err(|_| {
                Error::invalid_usage("PIPEWATCH_MAX_RETRIES must be an integer")
            })?;
        }

        Ok(config)
    }
}
