//! Mock HTTP client for testing.
//!
//! Provides a scripted mock transport: per-URL queues of responses, byte
//! streams delivered in exactly the chunks given, and requests that never
//! resolve (for timeout and cancellation tests).

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::traits::{
    ByteStream, Headers, HttpClient, HttpError, HttpRequest, Method, RequestBody, Response,
    StreamingResponse,
};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: RequestBody,
    /// When the request reached the transport (follows paused tokio time).
    pub at: Instant,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response (any status)
    Success(Response),
    /// Fail at the transport level
    Error(HttpError),
    /// 200 with a body delivered in exactly these chunks
    Stream(Vec<Bytes>),
    /// Given status with a body delivered in these chunks
    StreamWithStatus(u16, Vec<Bytes>),
    /// 200 with no readable body
    StreamWithoutBody,
    /// Deliver the chunks, then fail the body read
    StreamError(Vec<Bytes>, HttpError),
    /// Deliver the chunks, then never end
    StreamPending(Vec<Bytes>),
    /// Never respond
    Pending,
}

/// Mock HTTP client for testing.
///
/// Responses are looked up by URL: exact match first, then the longest
/// configured prefix, then the default. Each URL holds a queue; a response
/// is consumed while more remain behind it, and the last one is sticky.
///
/// # Example
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.push_response(url, MockResponse::Success(Response::new(500, "boom")));
/// client.push_response(url, MockResponse::Success(Response::new(200, "{}")));
/// // first call gets 500, every later call gets 200
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything queued for `url` with a single sticky response.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), VecDeque::from([response]));
    }

    /// Append a response to the queue for `url`.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Clear all configured responses.
    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
    }

    fn record_request(&self, request: &HttpRequest) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            at: Instant::now(),
        });
    }

    /// Get the next response for a URL.
    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut responses = self.responses.lock().unwrap();

        let key = if responses.contains_key(url) {
            Some(url.to_string())
        } else {
            responses
                .keys()
                .filter(|pattern| url.starts_with(pattern.as_str()))
                .max_by_key(|pattern| pattern.len())
                .cloned()
        };

        if let Some(queue) = key.and_then(|key| responses.get_mut(&key)) {
            if queue.len() > 1 {
                return queue.pop_front();
            }
            if let Some(response) = queue.front() {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn body_stream(chunks: Vec<Bytes>, tail: Tail) -> ByteStream {
        let head = stream::iter(chunks.into_iter().map(Ok));
        match tail {
            Tail::End => Box::pin(head),
            Tail::Fail(err) => Box::pin(futures::StreamExt::chain(
                head,
                stream::once(async move { Err(err) }),
            )),
            Tail::Hang => Box::pin(futures::StreamExt::chain(head, stream::pending())),
        }
    }
}

enum Tail {
    End,
    Fail(HttpError),
    Hang,
}

fn concat(chunks: &[Bytes]) -> Bytes {
    chunks.concat().into()
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<Response, HttpError> {
        self.record_request(&request);

        match self.next_response(&request.url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) | Some(MockResponse::StreamError(_, err)) => Err(err),
            Some(MockResponse::Stream(chunks)) => Ok(Response::new(200, concat(&chunks))),
            Some(MockResponse::StreamWithStatus(status, chunks)) => {
                Ok(Response::new(status, concat(&chunks)))
            }
            Some(MockResponse::StreamWithoutBody) => Ok(Response::new(200, Bytes::new())),
            Some(MockResponse::StreamPending(_)) | Some(MockResponse::Pending) => {
                futures::future::pending().await
            }
            None => Err(HttpError::Other(format!(
                "No mock response for URL: {}",
                request.url
            ))),
        }
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<StreamingResponse, HttpError> {
        self.record_request(&request);

        let (status, body) = match self.next_response(&request.url) {
            Some(MockResponse::Success(response)) => (
                response.status,
                Some(Self::body_stream(vec![response.body], Tail::End)),
            ),
            Some(MockResponse::Error(err)) => return Err(err),
            Some(MockResponse::Stream(chunks)) => {
                (200, Some(Self::body_stream(chunks, Tail::End)))
            }
            Some(MockResponse::StreamWithStatus(status, chunks)) => {
                (status, Some(Self::body_stream(chunks, Tail::End)))
            }
            Some(MockResponse::StreamWithoutBody) => (200, None),
            Some(MockResponse::StreamError(chunks, err)) => {
                (200, Some(Self::body_stream(chunks, Tail::Fail(err))))
            }
            Some(MockResponse::StreamPending(chunks)) => {
                (200, Some(Self::body_stream(chunks, Tail::Hang)))
            }
            Some(MockResponse::Pending) => futures::future::pending().await,
            None => {
                return Err(HttpError::Other(format!(
                    "No mock response for URL: {}",
                    request.url
                )))
            }
        };

        Ok(StreamingResponse::new(status, body))
    }
}
