//! CustomGPT API client.
//!
//! [`CustomGptClient`] owns the immutable configuration, the transport and the
//! registry of in-flight requests. Buffered calls go through
//! [`CustomGptClient::execute`]; streaming calls through
//! [`CustomGptClient::stream`](crate::stream). Typed endpoint methods live in
//! [`crate::endpoints`].

mod engine;
mod request;

pub use request::{ApiRequest, RequestOptions};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::registry::{RequestId, RequestRegistry};
use crate::traits::{Headers, HttpClient, RequestBody};

pub(crate) const ACCEPT_JSON: &str = "application/json";
pub(crate) const ACCEPT_EVENT_STREAM: &str = "text/event-stream";

/// Client for the CustomGPT REST API.
///
/// Cheap to clone; clones share the transport and the registry, so
/// [`cancel_all`](Self::cancel_all) on any clone aborts everything.
#[derive(Clone)]
pub struct CustomGptClient {
    config: Arc<ClientConfig>,
    http: Arc<dyn HttpClient>,
    registry: RequestRegistry,
}

impl CustomGptClient {
    /// Create a client using the reqwest transport.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    /// Create a client on top of any [`HttpClient`] (e.g. a mock in tests).
    pub fn with_http_client(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            config: Arc::new(config),
            http,
            registry: RequestRegistry::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    /// Abort one in-flight request or stream. No-op for unknown ids.
    pub fn cancel(&self, id: &RequestId) -> bool {
        self.registry.cancel(id)
    }

    /// Abort everything in flight. Returns how many entries were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.registry.cancel_all()
    }

    /// Number of requests and streams currently in flight.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn http(&self) -> &dyn HttpClient {
        self.http.as_ref()
    }

    /// Join the base URL with `path` and append the query pairs.
    pub(crate) fn build_url(&self, path: &str, query: &[(String, String)]) -> ApiResult<String> {
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{}{}", self.config.base_url(), separator, path))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    /// Authenticated headers. Multipart bodies get no explicit content type
    /// so the transport can set the boundary.
    pub(crate) fn headers(&self, accept: &str, body: &RequestBody) -> Headers {
        let mut headers = Headers::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.config.api_key()),
        );
        headers.insert("Accept".to_string(), accept.to_string());
        if !body.is_multipart() {
            headers.insert("Content-Type".to_string(), ACCEPT_JSON.to_string());
        }
        headers
    }
}

impl fmt::Debug for CustomGptClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomGptClient")
            .field("config", &self.config)
            .field("in_flight", &self.registry.len())
            .finish()
    }
}

/// Run `fut` until it finishes, `token` is cancelled, or `deadline` passes.
pub(crate) async fn race<F: Future>(
    token: &CancellationToken,
    deadline: Instant,
    budget: Duration,
    fut: F,
) -> ApiResult<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::cancelled()),
        _ = tokio::time::sleep_until(deadline) => Err(ApiError::timeout(budget)),
        output = fut => Ok(output),
    }
}
