//! Request description handed to the engines.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::retry::RetryPolicy;
use crate::traits::{Method, MultipartForm, RequestBody};

/// Per-call overrides. Anything left `None` falls back to the client config.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Budget for one attempt (requests) or the whole stream (streams).
    pub timeout: Option<Duration>,
    /// Ignored by streams, which are never retried.
    pub retry: Option<RetryPolicy>,
    /// Caller-owned handle; cancelling it aborts the call.
    pub cancel: Option<CancellationToken>,
    /// Language sent with streaming requests.
    pub lang: Option<String>,
}

/// One logical API call: method, path relative to the base URL, query,
/// body and options.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) options: RequestOptions,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            options: RequestOptions::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add a query parameter. `None` values are omitted from the URL.
    pub fn query<V: ToString>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.query.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json_body<T: Serialize>(self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::invalid_request(format!("Failed to encode body: {}", e)))?;
        Ok(self.json(value))
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.options.retry = Some(policy);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.options.cancel = Some(token);
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.options.lang = Some(lang.into());
        self
    }

    /// Merge caller options; fields set in `options` win.
    pub fn options(mut self, options: RequestOptions) -> Self {
        let RequestOptions {
            timeout,
            retry,
            cancel,
            lang,
        } = options;
        self.options.timeout = timeout.or(self.options.timeout);
        self.options.retry = retry.or(self.options.retry);
        self.options.cancel = cancel.or(self.options.cancel.take());
        self.options.lang = lang.or(self.options.lang.take());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}
