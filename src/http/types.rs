//! Request/response data model
//!
//! These are the values that flow across the transport seam. They carry no
//! behavior beyond construction helpers, so every attempt can rebuild a fresh
//! [`RequestSpec`] cheaply.

use crate::error::{Error, Result};
use crate::template;
use crate::types::{JsonValue, Method, StringMap};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

// ============================================================================
// Headers
// ============================================================================

/// Header map with case-insensitive keys and last-write-wins semantics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value for the same name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Get a header value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check if a header is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Iterate over (lowercased name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// A remote operation: base URL, path template and method
///
/// Identity is `(method, path template)`; two endpoints that only differ in
/// base URL compare equal.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: Url,
    path: String,
    method: Method,
}

impl Endpoint {
    /// Create an endpoint from a base URL and path template
    pub fn new(method: Method, base_url: &str, path: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::invalid_value(
                "base_url",
                format!("'{base_url}' cannot be used as a base URL"),
            ));
        }
        Ok(Self {
            base_url,
            path: path.into(),
            method,
        })
    }

    /// Create a GET endpoint
    pub fn get(base_url: &str, path: impl Into<String>) -> Result<Self> {
        Self::new(Method::GET, base_url, path)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Names of the path parameters this endpoint requires
    pub fn path_params(&self) -> Vec<String> {
        template::extract_variables(&self.path)
    }

    /// Resolve the path template into a concrete URL
    pub fn resolve(&self, path_params: &StringMap) -> Result<Url> {
        template::render_path(&self.base_url, &self.path, path_params)
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.path == other.path
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.method.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

// ============================================================================
// RequestSpec
// ============================================================================

/// One concrete request, built fresh for every attempt
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: Method,
    /// Resolved URL (may already carry a query string)
    pub url: Url,
    /// Request headers
    pub headers: Headers,
    /// Query parameters appended to the URL
    pub query: StringMap,
    /// JSON request body
    pub body: Option<JsonValue>,
}

impl RequestSpec {
    /// Create a request with no headers, query or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            query: StringMap::new(),
            body: None,
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// URL with the query parameters applied
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

// ============================================================================
// Response
// ============================================================================

/// Raw transport response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Raw body bytes
    pub body: Bytes,
}

impl Response {
    /// Create a response
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a 200 response with a JSON body
    pub fn json_ok(body: &JsonValue) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type", "application/json");
        Self::new(200, headers, body.to_string())
    }

    /// Body as (lossy) UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON; failures are protocol errors
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::protocol(format!("invalid JSON body: {e}")))
    }
}

// ============================================================================
// ResponseOutcome
// ============================================================================

/// Classified result of one attempt
#[derive(Debug)]
pub enum ResponseOutcome<T = Response> {
    /// The attempt produced a usable value
    Success(T),
    /// The attempt failed in a way that may succeed if repeated
    RetryableFailure(Error),
    /// The attempt failed permanently
    FatalFailure(Error),
}

impl<T> ResponseOutcome<T> {
    /// Classify an error by its retryability
    pub fn from_error(error: Error) -> Self {
        if error.is_retryable() {
            Self::RetryableFailure(error)
        } else {
            Self::FatalFailure(error)
        }
    }

    /// Chain a fallible step onto a success, classifying its error
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U>) -> ResponseOutcome<U> {
        match self {
            Self::Success(value) => match f(value) {
                Ok(next) => ResponseOutcome::Success(next),
                Err(e) => ResponseOutcome::from_error(e),
            },
            Self::RetryableFailure(e) => ResponseOutcome::RetryableFailure(e),
            Self::FatalFailure(e) => ResponseOutcome::FatalFailure(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure(_))
    }

    /// The failure, if this outcome is one
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Success(_) => None,
            Self::RetryableFailure(e) | Self::FatalFailure(e) => Some(e),
        }
    }
}
