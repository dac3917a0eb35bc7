//! Client facade
//!
//! Owns the configuration and the shared transport, rate limiter and retry
//! policy. Paging, pacing and retrying all happen below this layer; the
//! client only wires them together.

use crate::auth::Authenticator;
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::decode::{JsonPageDecoder, PageDecoder};
use crate::error::{Error, Result};
use crate::http::{Endpoint, Headers, ReqwestTransport, RequestExecutor, RequestSpec, Transport};
use crate::pagination::{PaginationStrategy, Paginator};
use crate::types::{JsonValue, Method, StringMap};
use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;

// ============================================================================
// Query
// ============================================================================

/// A request against one endpoint, minus anything paging adds
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    endpoint: Endpoint,
    path_params: StringMap,
    params: StringMap,
    headers: Headers,
    body: Option<JsonValue>,
}

impl Query {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            path_params: StringMap::new(),
            params: StringMap::new(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Fill a `{name}` placeholder in the endpoint path
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn params(&self) -> &StringMap {
        &self.params
    }

    /// Build a fresh request for one attempt
    pub fn build_request(&self) -> Result<RequestSpec> {
        let url = self.endpoint.resolve(&self.path_params)?;
        Ok(RequestSpec {
            method: self.endpoint.method(),
            url,
            headers: self.headers.clone(),
            query: self.params.clone(),
            body: self.body.clone(),
        })
    }
}

// ============================================================================
// Client
// ============================================================================

/// Entry point for paginated queries
///
/// Cloning is cheap; clones share the transport, the rate limiter and the
/// configuration, so pacing holds across all of them.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    executor: Arc<RequestExecutor>,
    strategy: Arc<dyn PaginationStrategy>,
}

impl Client {
    /// Build a client on the wall clock with a reqwest transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.http.timeout(), &config.http.user_agent)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(SystemClock))
    }

    /// Build a client on the given transport and clock
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let executor = RequestExecutor::new(transport, clock)
            .with_min_interval(config.http.min_request_interval())
            .with_policy(config.http.retry.policy())
            .with_auth(Authenticator::new(config.auth.clone()))
            .with_timeout(config.http.timeout())
            .with_default_headers(config.http.headers.iter().collect())
            .with_retry_statuses(config.http.retry.retry_statuses.clone());

        Ok(Self {
            strategy: config.pagination.build(),
            executor: Arc::new(executor),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Endpoint on the configured base URL
    pub fn endpoint(&self, method: Method, path: impl Into<String>) -> Result<Endpoint> {
        Endpoint::new(method, &self.config.base_url, path)
    }

    /// GET query on the configured base URL
    pub fn get(&self, path: impl Into<String>) -> Result<Query> {
        Ok(Query::new(self.endpoint(Method::GET, path)?))
    }

    /// Paginator for manual page-by-page access
    pub fn paginator<T: Send + 'static>(
        &self,
        query: &Query,
        offset: u64,
        decoder: Arc<dyn PageDecoder<T>>,
    ) -> Result<Paginator<T>> {
        Paginator::new(
            self.executor.clone(),
            query.clone(),
            self.strategy.clone(),
            decoder,
            self.config.page_size,
            offset,
        )
    }

    /// All results of `query`, skipping the first `offset` items
    ///
    /// Items are decoded with the configured JSON layout.
    pub fn results<T>(&self, query: &Query, offset: u64) -> BoxStream<'static, Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let decoder = JsonPageDecoder::<T>::new(self.config.decoder.clone());
        self.results_with(query, offset, Arc::new(decoder))
    }

    /// All results of `query` decoded by `decoder`
    pub fn results_with<T: Send + 'static>(
        &self,
        query: &Query,
        offset: u64,
        decoder: Arc<dyn PageDecoder<T>>,
    ) -> BoxStream<'static, Result<T>> {
        match self.paginator(query, offset, decoder) {
            Ok(paginator) => paginator.into_stream(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    /// Single request decoded as JSON, without paging
    pub async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> Result<T> {
        self.executor
            .execute(query.endpoint(), || query.build_request(), |r| r.json())
            .await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("page_size", &self.config.page_size)
            .field("strategy", &self.strategy)
            .field("executor", &self.executor)
            .finish()
    }
}

impl From<Endpoint> for Query {
    fn from(endpoint: Endpoint) -> Self {
        Self::new(endpoint)
    }
}
