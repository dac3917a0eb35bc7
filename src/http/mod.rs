//! HTTP execution module
//!
//! Provides the transport seam plus pacing, retry and classification around it.
//!
//! # Features
//!
//! - **Transport**: one request/response exchange, reqwest-backed by default
//! - **Rate Limiting**: minimum spacing between request starts
//! - **Retries**: stateless policy with constant, linear or exponential backoff
//! - **Classification**: success, retryable or fatal as data, not control flow

mod executor;
mod rate_limit;
mod retry;
mod transport;
mod types;

pub use executor::{classify, RequestExecutor, DEFAULT_RETRY_STATUSES, DEFAULT_TIMEOUT};
pub use rate_limit::RateLimiter;
pub use retry::{Decision, RetryPolicy, RetryState};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportErrorKind};
pub use types::{Endpoint, Headers, RequestSpec, Response, ResponseOutcome};
