//! Retry policy for transport calls.
//!
//! A policy is pure configuration: it holds no execution state and is safe
//! to share across concurrent calls. The transport consults it once per
//! logical request.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry configuration for a logical HTTP operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound on the backoff curve, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// HTTP status codes that qualify for retry. When unset, server errors
    /// (5xx) and 429 are retried; 4xx are not. Network-level failures are
    /// always retryable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable_statuses: Option<Vec<u16>>,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    30000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            retryable_statuses: None,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Whether a response status qualifies for retry.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        match &self.retryable_statuses {
            Some(statuses) => statuses.contains(&status),
            None => status >= 500 || status == 429,
        }
    }

    /// Deterministic capped exponential delay for a 1-indexed attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let delay = (self.base_delay_ms as f64) * 2f64.powi(exp as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }

    /// [`backoff_delay`](Self::backoff_delay) scaled by a uniform jitter
    /// factor in `[0.5, 1.5)`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let factor: f64 = rand::thread_rng().gen_range(0.5..1.5);
        self.backoff_delay(attempt).mul_f64(factor)
    }
}
