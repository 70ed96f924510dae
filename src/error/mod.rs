//! Error handling for the CustomGPT client.
//!
//! All operations fail with a single [`ApiError`]:
//!
//! | Kind | Status | Cause | Retried by default |
//! |------|--------|-------|--------------------|
//! | Network | 0 | DNS, connect, reset, body read failure | Yes |
//! | Timeout | 408 | Client-side timer expired | Yes |
//! | Cancelled | 408 | Cancellation handle triggered | No |
//! | Http | actual | Non-2xx response | Yes |
//! | Stream | 0 | `error` chunk inside a stream | Streams are never retried |
//! | Decode | 0 | Body is not the expected JSON | Yes |
//! | InvalidRequest | 0 | URL or body could not be built | No |
//!
//! Non-streaming calls return the error; streaming calls report it through
//! `StreamHandler::on_error`. The two channels are mutually exclusive.

mod api_error;
mod classify;
mod kind;

pub use api_error::{ApiError, STATUS_ABORTED, STATUS_NETWORK};
pub use classify::{classify_transport_error, error_from_body};
pub use kind::ErrorKind;

/// Type alias for Results using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;
