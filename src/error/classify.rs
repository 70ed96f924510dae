//! Mapping transport failures and HTTP error bodies onto [`ApiError`].

use std::time::Duration;

use serde_json::Value;

use super::api_error::ApiError;
use crate::traits::HttpError;

/// Classify a transport failure.
///
/// `timeout` is the budget that was in force, used for the message when the
/// transport itself reports a timeout.
pub fn classify_transport_error(err: &HttpError, timeout: Duration) -> ApiError {
    match err {
        HttpError::Timeout(_) => ApiError::timeout(timeout),
        HttpError::Cancelled => ApiError::cancelled(),
        HttpError::InvalidUrl(msg) => ApiError::invalid_request(format!("Invalid URL: {}", msg)),
        HttpError::ConnectionFailed(_) | HttpError::Io(_) | HttpError::Other(_) => {
            ApiError::network(err.to_string())
        }
    }
}

/// Build the error for a non-2xx response from its body text.
///
/// The message is taken from the JSON body's `message`, then `error` (string
/// or `{message}` object), then `data.message`; otherwise the raw text, or
/// `HTTP <status>` for an empty body.
pub fn error_from_body(status: u16, body: &str) -> ApiError {
    let trimmed = body.trim();
    let parsed = serde_json::from_str::<Value>(trimmed).ok();

    let message = parsed
        .as_ref()
        .and_then(message_from_json)
        .or_else(|| (!trimmed.is_empty()).then(|| trimmed.to_string()))
        .unwrap_or_else(|| format!("HTTP {}", status));

    let mut err = ApiError::http(status, message);
    if let Some(json) = parsed {
        if let Some(code) = json.get("code").and_then(code_string) {
            err = err.with_code(code);
        }
        err = err.with_details(json);
    }
    err
}

fn message_from_json(json: &Value) -> Option<String> {
    if let Some(s) = json.get("message").and_then(Value::as_str) {
        return Some(s.to_string());
    }
    match json.get("error") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Object(inner)) => {
            if let Some(s) = inner.get("message").and_then(Value::as_str) {
                return Some(s.to_string());
            }
        }
        _ => {}
    }
    json.get("data")
        .and_then(|data| data.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn code_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
