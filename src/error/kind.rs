//! Classification of API failures.
//!
//! Every [`ApiError`](super::ApiError) carries an [`ErrorKind`] alongside its
//! numeric status so callers can tell a client-side timeout from an explicit
//! cancellation even though both surface as status `408`.

use std::fmt;

/// What went wrong, independent of the numeric status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No HTTP response at all (DNS, connect, reset). Status `0`.
    Network,

    /// The client-side timer fired before the response completed. Status `408`.
    Timeout,

    /// The request was aborted through its cancellation handle. Status `408`.
    Cancelled,

    /// The server answered with a non-2xx status. Status is the HTTP status.
    Http,

    /// The server sent an `error` chunk inside a stream. Status `0`.
    Stream,

    /// The response body could not be decoded into the expected type. Status `0`.
    Decode,

    /// The request could not be built (bad URL, unserializable body). Status `0`.
    InvalidRequest,
}

impl ErrorKind {
    /// Short label suitable for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Http => "http",
            ErrorKind::Stream => "stream",
            ErrorKind::Decode => "decode",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }

    /// Short error code for logs and bug reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Network => "E_API_NETWORK",
            ErrorKind::Timeout => "E_API_TIMEOUT",
            ErrorKind::Cancelled => "E_API_CANCEL",
            ErrorKind::Http => "E_API_HTTP",
            ErrorKind::Stream => "E_API_STREAM",
            ErrorKind::Decode => "E_API_DECODE",
            ErrorKind::InvalidRequest => "E_API_REQUEST",
        }
    }

    /// Whether this kind represents an aborted request (timer or explicit cancel).
    pub fn is_abort(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Cancelled)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
