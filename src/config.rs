//! Client configuration
//!
//! [`ClientConfig`] is loaded once when a [`Client`](crate::Client) is built
//! and never changes afterwards. It can be assembled in code through
//! [`ClientConfig::builder`] or read from YAML/JSON. Durations in files are
//! written in milliseconds.

use crate::auth::AuthConfig;
use crate::decode::DecoderConfig;
use crate::error::{Error, Result};
use crate::http::{RetryPolicy, DEFAULT_RETRY_STATUSES};
use crate::pagination::PaginationConfig;
use crate::types::{BackoffType, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Everything a client needs, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for API requests
    pub base_url: String,

    /// Items requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// How the API pages its results
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Where items, cursor and total live in a page body
    #[serde(default)]
    pub decoder: DecoderConfig,
}

fn default_page_size() -> u32 {
    100
}

impl ClientConfig {
    /// Create a config with defaults for everything but the base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: default_page_size(),
            auth: AuthConfig::default(),
            http: HttpConfig::default(),
            pagination: PaginationConfig::default(),
            decoder: DecoderConfig::default(),
        }
    }

    /// Create a new config builder
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url),
        }
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse JSON config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Check the values a client cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", format!("'{}': {e}", self.base_url)))?;
        if url.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "base_url",
                format!("'{}' cannot be used as a base URL", self.base_url),
            ));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be positive"));
        }
        if self.http.timeout_ms == 0 {
            return Err(Error::invalid_value("http.timeout_ms", "must be positive"));
        }
        let backoff = &self.http.retry.backoff;
        if backoff.initial_ms > backoff.max_ms {
            return Err(Error::invalid_value(
                "http.retry.backoff",
                format!(
                    "initial_ms ({}) exceeds max_ms ({})",
                    backoff.initial_ms, backoff.max_ms
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum gap between request starts in milliseconds (0 disables pacing)
    #[serde(default)]
    pub min_request_interval_ms: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers sent with every request unless the request sets them
    #[serde(default)]
    pub headers: StringMap,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            min_request_interval_ms: 0,
            user_agent: default_user_agent(),
            headers: StringMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("pagewise/{}", env!("CARGO_PKG_VERSION"))
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 4xx statuses treated as throttling and retried
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    /// Backoff between attempts
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Optional cap on the total backoff slept per request, in milliseconds
    #[serde(default)]
    pub max_elapsed_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_statuses: default_retry_statuses(),
            backoff: BackoffConfig::default(),
            max_elapsed_ms: None,
        }
    }
}

impl RetryConfig {
    /// The retry policy this config describes
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff.initial_ms),
            max_delay: Duration::from_millis(self.backoff.max_ms),
            backoff: self.backoff.backoff_type,
            max_elapsed: self.max_elapsed_ms.map(Duration::from_millis),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_statuses() -> Vec<u16> {
    DEFAULT_RETRY_STATUSES.to_vec()
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60_000
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set credentials
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set the minimum gap between request starts
    #[must_use]
    pub fn min_request_interval(mut self, interval: Duration) -> Self {
        self.config.http.min_request_interval_ms = duration_ms(interval);
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the maximum number of retries
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.http.retry.max_retries = max_retries;
        self
    }

    /// Set the backoff strategy
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.http.retry.backoff = BackoffConfig {
            backoff_type,
            initial_ms: duration_ms(initial),
            max_ms: duration_ms(max),
        };
        self
    }

    /// Cap the total backoff slept per request
    #[must_use]
    pub fn max_elapsed(mut self, budget: Duration) -> Self {
        self.config.http.retry.max_elapsed_ms = Some(duration_ms(budget));
        self
    }

    /// Set the 4xx statuses treated as retryable throttling
    #[must_use]
    pub fn retry_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.config.http.retry.retry_statuses = statuses;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.http.headers.insert(key.into(), value.into());
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    /// Set the pagination convention
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.config.pagination = pagination;
        self
    }

    /// Set the page body layout
    #[must_use]
    pub fn decoder(mut self, decoder: DecoderConfig) -> Self {
        self.config.decoder = decoder;
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
