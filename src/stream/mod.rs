//! Streaming responses.
//!
//! [`CustomGptClient::stream`](crate::client::CustomGptClient::stream) sends a
//! request with `stream=true`, decodes the SSE body incrementally and hands
//! each chunk to a [`StreamHandler`]. A stream ends in exactly one of:
//!
//! - a `[DONE]` line or `done` chunk → `on_complete`
//! - end of body without a done marker → `on_complete`
//! - an `error` chunk → `on_error` (kind `Stream`)
//! - transport failure, non-2xx status, timeout or cancellation → `on_error`
//!
//! Streams are never retried. [`StreamOutcome`] mirrors the terminal
//! callback for callers that prefer a return value.

mod engine;
mod handler;

pub use handler::{ChannelHandler, StreamCallbacks, StreamEvent, StreamHandler};

use crate::error::{ApiError, ApiResult};

/// Result of a finished stream, matching the terminal callback that fired.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed,
    Failed(ApiError),
}

impl StreamOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed)
    }

    pub fn into_result(self) -> ApiResult<()> {
        match self {
            StreamOutcome::Completed => Ok(()),
            StreamOutcome::Failed(err) => Err(err),
        }
    }
}
