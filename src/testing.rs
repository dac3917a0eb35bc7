//! Test doubles
//!
//! [`MockTransport`] replays scripted results and records every request with
//! the clock reading at the moment it was sent. [`MockDataset`] serves a fixed
//! list of items through offset/limit or cursor query parameters, the way a
//! typical list endpoint does.

use crate::clock::Clock;
use crate::http::{Headers, RequestSpec, Response, Transport, TransportError, TransportErrorKind};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

type Handler =
    Box<dyn Fn(&RequestSpec) -> std::result::Result<Response, TransportError> + Send + Sync>;

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request as sent, after auth and default headers
    pub request: RequestSpec,
    /// Clock reading when `send` was called
    pub at: Instant,
}

impl RecordedRequest {
    /// Value of a query parameter on this request
    pub fn query(&self, key: &str) -> Option<&str> {
        self.request.query.get(key).map(String::as_str)
    }
}

/// Scripted transport
///
/// Scripted results are consumed first, in order. Once the script is empty,
/// the handler (if any) answers; without one the call fails.
pub struct MockTransport {
    clock: Arc<dyn Clock>,
    script: Mutex<VecDeque<std::result::Result<Response, TransportError>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            script: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer unscripted calls with `handler`
    #[must_use]
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RequestSpec) -> std::result::Result<Response, TransportError> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Queue a result
    pub fn push(&self, result: std::result::Result<Response, TransportError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Queue a response with the given status and an empty body
    pub fn push_status(&self, status: u16) {
        self.push(Ok(Response::new(status, Headers::new(), "")));
    }

    /// Queue a 200 response with a JSON body
    pub fn push_json(&self, body: &JsonValue) {
        self.push(Ok(Response::json_ok(body)));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.push(Err(error));
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Gaps between consecutive request starts
    pub fn gaps(&self) -> Vec<Duration> {
        let requests = self.requests();
        requests
            .windows(2)
            .map(|pair| pair[1].at.saturating_duration_since(pair[0].at))
            .collect()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("calls", &self.call_count())
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: &RequestSpec,
        _timeout: Duration,
    ) -> std::result::Result<Response, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                request: request.clone(),
                at: self.clock.now(),
            });

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match (scripted, &self.handler) {
            (Some(result), _) => result,
            (None, Some(handler)) => handler(request),
            (None, None) => Err(TransportError::new(
                TransportErrorKind::Other,
                "no scripted response left",
            )),
        }
    }
}

/// Fixed list endpoint
///
/// Items are `{"id": i}` for `i` in `0..len`. Requests select a window with
/// `offset` (or an opaque `cursor` carrying the offset) and `limit`. Every
/// page reports `total` unless disabled, and `next_cursor` while items remain.
#[derive(Debug, Clone)]
pub struct MockDataset {
    items: Vec<JsonValue>,
    report_total: bool,
}

impl MockDataset {
    pub fn new(len: u64) -> Self {
        Self {
            items: (0..len).map(|id| json!({ "id": id })).collect(),
            report_total: true,
        }
    }

    /// Serve arbitrary items
    pub fn from_items(items: Vec<JsonValue>) -> Self {
        Self {
            items,
            report_total: true,
        }
    }

    /// Omit `total` from every page
    #[must_use]
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    pub fn items(&self) -> &[JsonValue] {
        &self.items
    }

    /// Build the page body for one request
    pub fn respond(&self, request: &RequestSpec) -> Response {
        let param = |key: &str| {
            request
                .query
                .get(key)
                .and_then(|v| v.parse::<usize>().ok())
        };
        let offset = param("offset").or_else(|| param("cursor")).unwrap_or(0);
        let limit = param("limit").unwrap_or(10);

        let start = offset.min(self.items.len());
        let end = offset.saturating_add(limit).min(self.items.len());
        let page = &self.items[start..end];

        let mut body = json!({ "items": page });
        if self.report_total {
            body["total"] = json!(self.items.len());
        }
        if end < self.items.len() {
            body["next_cursor"] = json!(end.to_string());
        }
        Response::json_ok(&body)
    }

    /// A transport answering every call from this dataset
    pub fn into_transport(self, clock: Arc<dyn Clock>) -> MockTransport {
        MockTransport::new(clock).with_handler(move |request| Ok(self.respond(request)))
    }
}
