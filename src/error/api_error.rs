//! The error type surfaced by every client operation.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::kind::ErrorKind;

/// Status used for failures that never produced an HTTP response.
pub const STATUS_NETWORK: u16 = 0;

/// Status used for client-side timeouts and cancellations.
pub const STATUS_ABORTED: u16 = 408;

/// A failed API call.
///
/// Non-streaming calls return it as `Err`; streaming calls hand it to
/// `StreamHandler::on_error` exactly once. `status` is `0` for network-level
/// failures, `408` for timeouts and cancellations, and the real HTTP status
/// otherwise.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    /// HTTP status, or `0`/`408` for non-HTTP failures.
    pub status: u16,
    /// Human-readable message, extracted from the server body when available.
    pub message: String,
    /// Machine-readable code sent by the server, if any.
    pub code: Option<String>,
    /// Parsed error body, if the server sent JSON.
    pub details: Option<Value>,
    /// Classification of the failure.
    pub kind: ErrorKind,
}

impl ApiError {
    fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            details: None,
            kind,
        }
    }

    /// Connection-level failure with no HTTP response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, STATUS_NETWORK, message)
    }

    /// The client-side timer expired.
    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            STATUS_ABORTED,
            format!("Request timed out after {}ms", after.as_millis()),
        )
    }

    /// The request was aborted through its cancellation handle.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, STATUS_ABORTED, "Request was cancelled")
    }

    /// Non-2xx HTTP response.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Http, status, message)
    }

    /// Error signalled by the server inside an event stream.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Stream, STATUS_NETWORK, message)
    }

    /// Response body did not match the expected shape.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, STATUS_NETWORK, message)
    }

    /// The request could not be constructed.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, STATUS_NETWORK, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether the failure is likely transient.
    ///
    /// Only consulted by `RetryMode::TransientOnly`; the default retry mode
    /// retries every failure except explicit cancellation.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ErrorKind::Network | ErrorKind::Timeout => true,
            ErrorKind::Http => self.status >= 500 || self.status == 429 || self.status == 408,
            ErrorKind::Cancelled
            | ErrorKind::Stream
            | ErrorKind::Decode
            | ErrorKind::InvalidRequest => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    /// A message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to reach CustomGPT. Please check your internet connection.".to_string()
            }
            ErrorKind::Timeout => {
                "The request timed out. The server may be slow or unreachable.".to_string()
            }
            ErrorKind::Cancelled => "The request was cancelled.".to_string(),
            ErrorKind::Http => match self.status {
                400 => format!("The request was invalid: {}", self.message),
                401 => "Your API key was rejected. Please check your settings.".to_string(),
                403 => "Access denied. You don't have permission for this action.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!("The server returned an error (HTTP {}).", self.status),
            },
            ErrorKind::Stream => format!("The response stream failed: {}", self.message),
            ErrorKind::Decode => {
                "Received an invalid response from the server. Please try again.".to_string()
            }
            ErrorKind::InvalidRequest => format!("Invalid request: {}", self.message),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::decode(format!("Invalid JSON: {}", err))
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::invalid_request(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_kind() {
        assert_eq!(ApiError::network("reset").status, 0);
        assert_eq!(ApiError::timeout(Duration::from_secs(30)).status, 408);
        assert_eq!(ApiError::cancelled().status, 408);
        assert_eq!(ApiError::http(503, "unavailable").status, 503);
        assert_eq!(ApiError::stream("boom").status, 0);
    }

    #[test]
    fn test_display_includes_status() {
        let err = ApiError::http(500, "Internal Server Error");
        let display = err.to_string();
        assert!(display.contains("500"));
        assert!(display.contains("Internal Server Error"));
    }

    #[test]
    fn test_timeout_message_mentions_duration() {
        let err = ApiError::timeout(Duration::from_millis(1500));
        assert!(err.message.contains("1500ms"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_retryable() {
        assert!(ApiError::network("x").is_retryable());
        assert!(ApiError::timeout(Duration::from_secs(1)).is_retryable());
        assert!(ApiError::http(500, "x").is_retryable());
        assert!(ApiError::http(429, "x").is_retryable());
        assert!(!ApiError::http(400, "x").is_retryable());
        assert!(!ApiError::http(404, "x").is_retryable());
        assert!(!ApiError::cancelled().is_retryable());
        assert!(!ApiError::decode("x").is_retryable());
    }

    #[test]
    fn test_builders() {
        let err = ApiError::http(422, "bad")
            .with_code("validation_failed")
            .with_details(serde_json::json!({"field": "name"}));
        assert_eq!(err.code.as_deref(), Some("validation_failed"));
        assert_eq!(err.details.unwrap()["field"], "name");
    }

    #[test]
    fn test_user_message_non_empty() {
        let errors = vec![
            ApiError::network("x"),
            ApiError::timeout(Duration::from_secs(1)),
            ApiError::cancelled(),
            ApiError::http(401, "x"),
            ApiError::http(418, "x"),
            ApiError::stream("x"),
            ApiError::decode("x"),
            ApiError::invalid_request("x"),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<Value>("not json").unwrap_err();
        let err: ApiError = json_err.into();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(err.status, 0);
    }
}
