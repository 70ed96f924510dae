//! Mock implementations for testing.
//!
//! Enables exercising the request and stream engines without network access,
//! with full control over chunk boundaries and timing.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP transport with scripted responses

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
