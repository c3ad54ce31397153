//! Resilient HTTP transport to the watch service.
//!
//! Performs one logical HTTP operation with retry and classifies failures:
//! anything below the HTTP layer becomes [`Error::Network`], any non-2xx
//! response becomes [`Error::Api`]. The underlying `reqwest::Client` pools
//! connections and is safe to share across threads; one client is created
//! per transport and reused for every call.

use std::time::Duration;

use reqwest::{header, Client, Method};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::core::retry::RetryPolicy;
use crate::error::{ApiError, Error, Result};

/// HTTP transport with retry, jittered backoff, and connection reuse.
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    retry: RetryPolicy,
    bearer_token: Option<String>,
}

impl Transport {
    /// Create a transport against `base_url` with a fixed per-attempt
    /// request timeout.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
        bearer_token: Option<String>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            retry,
            bearer_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one logical request, retrying retryable failures per policy.
    ///
    /// Returns the decoded JSON body on 2xx (`Value::Null` for an empty
    /// body). On a retryable failure the call sleeps for
    /// `min(max_delay, base_delay * 2^(attempt-1))` scaled by a uniform
    /// jitter factor in `[0.5, 1.5)`, then tries again up to `max_attempts`.
    /// Non-retryable failures return immediately; after the final attempt
    /// the last-seen error is returned as-is.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        retry_override: Option<&RetryPolicy>,
    ) -> Result<Value> {
        let policy = retry_override.unwrap_or(&self.retry);
        let url = format!("{}{}", self.base_url, path);

        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.send_once(&method, &url, body).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let retryable = match &e {
                        Error::Network { .. } => true,
                        Error::Api(api) => policy.is_retryable_status(api.status),
                        _ => false,
                    };

                    if retryable && policy.should_retry(attempt) {
                        let delay = policy.jittered_delay(attempt);
                        warn!(
                            %url,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    error!(%url, attempt, error = %e, "request failed permanently");
                    return Err(e);
                }
            }
        }
    }

    /// One attempt: send, classify, decode.
    async fn send_once(&self, method: &Method, url: &str, body: Option<&Value>) -> Result<Value> {
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method.clone(), url);

        if let Some(token) = &self.bearer_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ApiError::from_response(status.as_u16(), text).into())
        }
    }
}
