//! Request executor
//!
//! Composes pacing, retry and transport into one reliable logical request:
//!
//! 1. wait on the rate limiter
//! 2. build a fresh [`RequestSpec`] (auth and default headers are re-applied)
//! 3. send it and classify the result into a [`ResponseOutcome`]
//! 4. on failure ask the [`RetryPolicy`], sleep and loop, or give up

use super::rate_limit::RateLimiter;
use super::retry::{Decision, RetryPolicy, RetryState};
use super::transport::{Transport, TransportError};
use super::types::{Endpoint, Headers, RequestSpec, Response, ResponseOutcome};
use crate::auth::Authenticator;
use crate::clock::Clock;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 4xx statuses retried by default
pub const DEFAULT_RETRY_STATUSES: &[u16] = &[408, 429];

/// Default per-call transport timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Performs one logical request with pacing and retries
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    auth: Authenticator,
    timeout: Duration,
    default_headers: Headers,
    retry_statuses: Vec<u16>,
}

impl RequestExecutor {
    /// Create an executor with no pacing and the default retry policy
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            limiter: Arc::new(RateLimiter::new(Duration::ZERO, clock.clone())),
            policy: RetryPolicy::default(),
            clock,
            auth: Authenticator::default(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: Headers::new(),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }

    /// Share an existing rate limiter
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Pace requests on this executor's clock
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.limiter = Arc::new(RateLimiter::new(min_interval, self.clock.clone()));
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: Authenticator) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Headers added to every request that does not already set them
    #[must_use]
    pub fn with_default_headers(mut self, headers: Headers) -> Self {
        self.default_headers = headers;
        self
    }

    /// 4xx statuses treated as retryable throttling
    #[must_use]
    pub fn with_retry_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retry_statuses = statuses;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a request, returning the raw successful response
    pub async fn send<B>(&self, endpoint: &Endpoint, build: B) -> Result<Response>
    where
        B: Fn() -> Result<RequestSpec>,
    {
        self.execute(endpoint, build, |response| Ok(response.clone()))
            .await
    }

    /// Execute a request and decode the successful response
    ///
    /// `build` runs once per attempt. `decode` runs on every 2xx response; its
    /// error is classified like any other failure, so a retryable decode error
    /// (a short interior page) is retried while a protocol error is not.
    pub async fn execute<T, B, D>(&self, endpoint: &Endpoint, build: B, decode: D) -> Result<T>
    where
        B: Fn() -> Result<RequestSpec>,
        D: Fn(&Response) -> Result<T>,
    {
        let mut state = RetryState::new();

        loop {
            self.limiter.wait_if_needed().await;

            let mut spec = build()?;
            for (name, value) in self.default_headers.iter() {
                if !spec.headers.contains(name) {
                    spec.headers.insert(name, value);
                }
            }
            self.auth.apply(&mut spec);

            debug!(
                "{} {} (attempt {})",
                spec.method,
                spec.url,
                state.attempts_made()
            );

            let result = self.transport.send(&spec, self.timeout).await;
            let outcome = classify(result, &self.retry_statuses, self.clock.utc_now())
                .and_then(|r| decode(&r));

            match (self.policy.should_retry(&state, &outcome), outcome) {
                (_, ResponseOutcome::Success(value)) => return Ok(value),
                (Decision::RetryAfter(delay), ResponseOutcome::RetryableFailure(e)) => {
                    warn!(
                        "{} failed: {}, attempt {}/{}, retrying in {:?}",
                        endpoint,
                        e,
                        state.attempts_made(),
                        self.policy.max_retries + 1,
                        delay
                    );
                    self.clock.sleep(delay).await;
                    state.record(delay);
                }
                (_, ResponseOutcome::RetryableFailure(e)) => {
                    return Err(Error::RetryBudgetExhausted {
                        endpoint: endpoint.to_string(),
                        status: e.status(),
                        attempts: state.attempts_made(),
                        source: Box::new(e),
                    });
                }
                (_, ResponseOutcome::FatalFailure(e)) if state.attempt() == 0 => return Err(e),
                (_, ResponseOutcome::FatalFailure(e)) => {
                    return Err(Error::FailedAfterRetries {
                        endpoint: endpoint.to_string(),
                        attempts: state.attempts_made(),
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("policy", &self.policy)
            .field("limiter", &self.limiter)
            .field("timeout", &self.timeout)
            .field("retry_statuses", &self.retry_statuses)
            .finish_non_exhaustive()
    }
}

/// Classify a transport result
///
/// `retry_statuses` lists the 3xx/4xx statuses that count as throttling.
/// `now` is the calendar time an HTTP-date `Retry-After` is measured from.
pub fn classify(
    result: std::result::Result<Response, TransportError>,
    retry_statuses: &[u16],
    now: DateTime<Utc>,
) -> ResponseOutcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => return ResponseOutcome::RetryableFailure(Error::Transport(e)),
    };

    match response.status {
        s if s < 300 => ResponseOutcome::Success(response),
        s if s >= 500 => ResponseOutcome::RetryableFailure(Error::server(s, response.text())),
        s if retry_statuses.contains(&s) => ResponseOutcome::RetryableFailure(Error::Throttled {
            status: s,
            retry_after: extract_retry_after(&response.headers, now),
        }),
        s => ResponseOutcome::FatalFailure(Error::http_status(s, response.text())),
    }
}

/// Extract the `Retry-After` header as delta-seconds or an HTTP-date
fn extract_retry_after(headers: &Headers, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get("retry-after")?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = date.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

#[cfg(test)]
mod classify_tests {
    use super::*;
    use test_case::test_case;

    fn response(status: u16) -> Response {
        Response::new(status, Headers::new(), "body")
    }

    #[test_case(200 ; "ok")]
    #[test_case(201 ; "created")]
    #[test_case(204 ; "no content")]
    fn test_success_statuses(status: u16) {
        assert!(classify(Ok(response(status)), DEFAULT_RETRY_STATUSES, Utc::now()).is_success());
    }

    #[test_case(500 ; "internal")]
    #[test_case(502 ; "bad gateway")]
    #[test_case(503 ; "unavailable")]
    fn test_server_errors_are_retryable(status: u16) {
        let outcome = classify(Ok(response(status)), DEFAULT_RETRY_STATUSES, Utc::now());
        assert!(matches!(
            outcome,
            ResponseOutcome::RetryableFailure(Error::Server { .. })
        ));
    }

    #[test_case(301 ; "moved")]
    #[test_case(400 ; "bad request")]
    #[test_case(401 ; "unauthorized")]
    #[test_case(404 ; "not found")]
    fn test_client_errors_are_fatal(status: u16) {
        let outcome = classify(Ok(response(status)), DEFAULT_RETRY_STATUSES, Utc::now());
        assert!(matches!(outcome, ResponseOutcome::FatalFailure(Error::Http { .. })));
    }

    #[test]
    fn test_allow_listed_status_is_throttled() {
        let mut headers = Headers::new();
        headers.insert("Retry-After", "7");
        let response = Response::new(429, headers, "");
        let outcome = classify(Ok(response), DEFAULT_RETRY_STATUSES, Utc::now());

        match outcome {
            ResponseOutcome::RetryableFailure(Error::Throttled {
                status,
                retry_after,
            }) => {
                assert_eq!(status, 429);
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_allow_list_is_configurable() {
        let outcome = classify(Ok(response(429)), &[], Utc::now());
        assert!(matches!(outcome, ResponseOutcome::FatalFailure(_)));

        let outcome = classify(Ok(response(409)), &[409], Utc::now());
        assert!(outcome.is_retryable());
    }

    #[test]
    fn test_transport_error_is_retryable() {
        let error = TransportError::connect("refused");
        let outcome = classify(Err(error), DEFAULT_RETRY_STATUSES, Utc::now());
        assert!(matches!(
            outcome,
            ResponseOutcome::RetryableFailure(Error::Transport(_))
        ));
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = Headers::new();
        headers.insert("retry-after", "Wed, 21 Oct 2015 07:30:00 GMT");

        let delay = extract_retry_after(&headers, at("2015-10-21T07:28:00Z"));
        assert_eq!(delay, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_retry_after_in_the_past_is_zero() {
        let mut headers = Headers::new();
        headers.insert("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(
            extract_retry_after(&headers, at("2015-10-21T08:00:00Z")),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_retry_after_garbage_is_ignored() {
        let mut headers = Headers::new();
        headers.insert("retry-after", "soon");
        assert_eq!(extract_retry_after(&headers, Utc::now()), None);
    }
}
