//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP transport (buffered and streaming requests)

pub mod http;

pub use http::{
    ByteStream, FormPart, FormValue, Headers, HttpClient, HttpError, HttpRequest, Method,
    MultipartForm, RequestBody, Response, StreamingResponse,
};
