//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production transport, implementing the
//! [`HttpClient`] trait from `crate::traits`. It applies no timeout of its
//! own; the request and stream engines enforce the client's budgets.

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::traits::{
    ByteStream, FormValue, Headers, HttpClient, HttpError, HttpRequest, Method, MultipartForm,
    RequestBody, Response, StreamingResponse,
};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use customgpt::adapters::ReqwestHttpClient;
/// use customgpt::traits::{HttpClient, HttpRequest, Method, RequestBody};
///
/// let client = ReqwestHttpClient::new();
/// let response = client
///     .send(HttpRequest {
///         method: Method::Get,
///         url: "https://app.customgpt.ai/api/v1/user".into(),
///         headers: Default::default(),
///         body: RequestBody::Empty,
///     })
///     .await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// This allows for advanced configuration like proxies, connection
    /// pools, or TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else if err.is_body() || err.is_decode() {
            HttpError::Io(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn convert_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    /// Build a reqwest multipart form. reqwest sets the boundary header.
    fn convert_form(form: &MultipartForm) -> Result<reqwest::multipart::Form, HttpError> {
        let mut out = reqwest::multipart::Form::new();
        for part in form.parts() {
            out = match &part.value {
                FormValue::Text(text) => out.text(part.name.clone(), text.clone()),
                FormValue::File {
                    file_name,
                    content_type,
                    data,
                } => {
                    let mut file =
                        reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        file = file
                            .mime_str(mime)
                            .map_err(|e| HttpError::Other(format!("Invalid mime type: {}", e)))?;
                    }
                    out.part(part.name.clone(), file)
                }
            };
        }
        Ok(out)
    }

    /// Turn an [`HttpRequest`] into a ready-to-send reqwest builder.
    fn build(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder, HttpError> {
        let mut builder = self
            .client
            .request(Self::convert_method(request.method), &request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| HttpError::Other(format!("Failed to encode body: {}", e)))?;
                builder.body(bytes)
            }
            RequestBody::Multipart(form) => builder.multipart(Self::convert_form(&form)?),
        };
        Ok(builder)
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<Response, HttpError> {
        let response = self
            .build(request)?
            .send()
            .await
            .map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(e.to_string())
            } else {
                HttpError::Io(e.to_string())
            }
        })?;

        Ok(Response::with_headers(status, headers, body))
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, HttpError> {
        let response = self
            .build(request)?
            .send()
            .await
            .map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let headers = Self::convert_headers(response.headers());
        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout(e.to_string())
                } else {
                    HttpError::Io(e.to_string())
                }
            })
        });
        let body: ByteStream = Box::pin(stream);

        Ok(StreamingResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}
