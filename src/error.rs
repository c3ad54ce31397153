//! Typed errors surfaced by the pipewatch client.
//!
//! Three failure families cross the crate boundary:
//! - [`ApiError`]: the service answered with a non-2xx status
//! - [`Error::Network`]: the request never produced an interpretable response
//! - [`Error::InvalidUsage`]: caller programming mistakes, never retried
//!
//! A business failure (`completed_successfully = false` inside an
//! [`ExecutionResult`]) is a normal, successfully reported outcome and is
//! not an error.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::domain::ExecutionResult;

/// Response text beyond this length is truncated in error messages.
const MAX_DISPLAY_TEXT: usize = 160;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-2xx response from the watch service.
///
/// Carries the raw response text plus the structured `code`/`message`/
/// `details` fields when the body is JSON.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code of the response.
    pub status: u16,

    /// Human-readable message, taken from the response body when present.
    pub message: String,

    /// Machine-readable error code from a structured body.
    pub error_code: Option<String>,

    /// Structured error details from the body, if any.
    pub details: Option<Value>,

    /// Raw response text as received.
    pub response_text: Option<String>,
}

impl ApiError {
    /// Build an error from a status code and raw response text.
    ///
    /// If the text parses as a JSON object, `message`, `code` and
    /// `details` are lifted out of it; otherwise the raw text is kept
    /// verbatim on `response_text`.
    pub fn from_response(status: u16, text: String) -> Self {
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        let field = |name: &str| -> Option<String> {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let message = field("message")
            .or_else(|| field("error"))
            .unwrap_or_else(|| format!("request failed with status {}", status));

        let details = parsed
            .as_ref()
            .and_then(|v| v.get("details").or_else(|| v.get("detail")))
            .cloned();

        Self {
            status,
            message,
            error_code: field("error_code").or_else(|| field("code")),
            details,
            response_text: Some(text),
        }
    }

    /// Construct directly from parts, without a response body.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code: None,
            details: None,
            response_text: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (HTTP {})", self.message, self.status)?;
        if let Some(code) = &self.error_code {
            write!(f, " [{}]", code)?;
        }
        match &self.response_text {
            Some(text) if !text.is_empty() && *text != self.message => {
                let shown: String = text.chars().take(MAX_DISPLAY_TEXT).collect();
                if text.chars().count() > MAX_DISPLAY_TEXT {
                    write!(f, ": {}...", shown)?;
                } else {
                    write!(f, ": {}", shown)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Errors raised by pipewatch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The service returned a non-2xx response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request failed below the HTTP layer (DNS, connect, timeout).
    #[error("network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// Caller programming mistake (missing identity fields, malformed
    /// configuration). Never retried, raised immediately.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),

    /// The tracked work itself failed. The failure was reported to the
    /// service before this error propagated; the wrapped error is the
    /// caller's original, unchanged.
    #[error("tracked work failed: {source:#}")]
    Work {
        #[source]
        source: anyhow::Error,
    },

    /// The work succeeded but reporting the execution end failed.
    ///
    /// The base [`ExecutionResult`] that was being reported is attached so
    /// callers can still recover the business outcome. Fields of custom
    /// result carriers beyond the base view are not preserved here.
    #[error("failed to report end of execution {execution_id}")]
    EndReport {
        execution_id: i64,
        result: Box<ExecutionResult>,
        #[source]
        source: Box<Error>,
    },

    /// A payload could not be serialized or a response could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("failed to parse configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Shorthand for an invalid-usage error.
    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage(message.into())
    }

    /// The API error behind this error, if that is what it is.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::EndReport { source, .. } => source.api(),
            _ => None,
        }
    }

    /// True when the failure happened below the HTTP layer.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Recover the caller's original work error, if this is the
    /// work-failure path.
    pub fn into_work_error(self) -> Option<anyhow::Error> {
        match self {
            Self::Work { source } => Some(source),
            _ => None,
        }
    }
}
