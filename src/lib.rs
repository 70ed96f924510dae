//! CustomGPT API client
//!
//! An async client for the CustomGPT REST API: a request engine with
//! timeouts and exponential-backoff retry, an SSE engine for streamed
//! answers, a registry of in-flight requests for cancellation, and typed
//! endpoint methods on [`CustomGptClient`].

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod registry;
pub mod retry;
pub mod sse;
pub mod stream;
pub mod traits;

pub use client::{ApiRequest, CustomGptClient, RequestOptions};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoints::{ListQuery, PageQuery};
pub use error::{ApiError, ApiResult, ErrorKind};
pub use registry::{RegistryGuard, RequestId, RequestRegistry};
pub use retry::{RetryMode, RetryPolicy};
pub use sse::StreamChunk;
pub use stream::{StreamCallbacks, StreamEvent, StreamHandler, StreamOutcome};
