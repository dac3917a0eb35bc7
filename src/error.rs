//! Error types for pagewise
//!
//! This module defines the error hierarchy for the whole client core.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Retry decisions are data decisions: [`Error::is_retryable`] is the single
//! place that says which failures the executor may recover from locally.

use std::time::Duration;
use thiserror::Error;

/// The main error type for pagewise
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transport / HTTP Errors
    // ============================================================================
    /// Connectivity, DNS or timeout failure. Always retryable.
    #[error("Transport error: {0}")]
    Transport(#[from] crate::http::TransportError),

    /// 5xx response. Retryable.
    #[error("Server error HTTP {status}: {body}")]
    Server { status: u16, body: String },

    /// Allow-listed 4xx response (e.g. 429). Retryable, honoring `Retry-After`.
    #[error("Throttled with HTTP {status}")]
    Throttled {
        status: u16,
        retry_after: Option<Duration>,
    },

    /// Non allow-listed 3xx/4xx response. Never retried.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ============================================================================
    // Response Errors
    // ============================================================================
    /// Well-formed HTTP response with an undecodable or unexpected body.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A page came back shorter than the reported total says it must be.
    #[error("Unexpected page: expected {expected} items, got {actual}")]
    UnexpectedPage { expected: u64, actual: u64 },

    // ============================================================================
    // Terminal / Caller Errors
    // ============================================================================
    #[error("Retry budget exhausted for {endpoint} after {attempts} attempts{}: {source}", fmt_status(.status))]
    RetryBudgetExhausted {
        endpoint: String,
        status: Option<u16>,
        attempts: u32,
        source: Box<Error>,
    },

    /// Fatal failure reached after one or more retries.
    #[error("{endpoint} failed after {attempts} attempts: {source}")]
    FailedAfterRetries {
        endpoint: String,
        attempts: u32,
        source: Box<Error>,
    },

    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    #[error("Failed to fetch page {index}: {source}")]
    Page { index: u64, source: Box<Error> },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (last status {s})")).unwrap_or_default()
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a protocol (undecodable response) error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a precondition violation
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a server error
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Server { .. }
                | Error::Throttled { .. }
                | Error::UnexpectedPage { .. }
        )
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Server { status, .. }
            | Error::Throttled { status, .. }
            | Error::Http { status, .. } => Some(*status),
            Error::RetryBudgetExhausted { status, .. } => *status,
            Error::Page { source, .. } | Error::FailedAfterRetries { source, .. } => {
                source.status()
            }
            _ => None,
        }
    }

    /// Transport calls made before the request gave up, if recorded
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Error::RetryBudgetExhausted { attempts, .. }
            | Error::FailedAfterRetries { attempts, .. } => Some(*attempts),
            Error::Page { source, .. } => source.attempts(),
            _ => None,
        }
    }

    /// Strip page-index and retry context and return the underlying error
    pub fn root(&self) -> &Error {
        match self {
            Error::Page { source, .. } | Error::FailedAfterRetries { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for pagewise
pub type Result<T> = std::result::Result<T, Error>;
