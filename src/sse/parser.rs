//! Line-level parsing of SSE payloads into [`StreamChunk`]s.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::chunk::{Citation, StreamChunk};

/// Sentinel payload marking the end of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Result of parsing one complete line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Blank line, comment or SSE field this client ignores.
    Skip,
    /// A chunk to deliver.
    Chunk(StreamChunk),
    /// Payload that is not valid JSON.
    Malformed { payload: String, error: String },
}

/// Parse a single line of an event stream.
///
/// `data: ` is stripped when present; lines without the prefix are parsed
/// as bare JSON.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return ParsedLine::Skip;
    }
    if ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
    {
        return ParsedLine::Skip;
    }

    let payload = line
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(line);

    if payload == DONE_SENTINEL {
        return ParsedLine::Chunk(StreamChunk::Done);
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => ParsedLine::Chunk(classify(value)),
        Err(e) => ParsedLine::Malformed {
            payload: payload.to_string(),
            error: e.to_string(),
        },
    }
}

/// Decode a JSON payload into a typed chunk.
///
/// An explicit `type` field wins. Otherwise a `content` field makes a content
/// chunk and a lone `citations` field makes a citation chunk. Anything else is
/// returned as [`StreamChunk::Unrecognized`].
pub fn classify(value: Value) -> StreamChunk {
    let map = match value {
        Value::Object(map) => map,
        other => return StreamChunk::Unrecognized(other),
    };

    let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
    match kind.as_deref() {
        Some("content") => StreamChunk::Content {
            text: text_field(&map, &["content", "text"]),
            citations: citations_field(&map),
        },
        Some("citation") | Some("citations") => StreamChunk::Citation {
            citations: citations_field(&map).unwrap_or_default(),
        },
        Some("done") => StreamChunk::Done,
        Some("error") => StreamChunk::Error {
            message: error_message(&map),
            code: map.get("code").and_then(code_string),
        },
        Some(_) => StreamChunk::Unrecognized(Value::Object(map)),
        None if map.contains_key("content") => StreamChunk::Content {
            text: text_field(&map, &["content"]),
            citations: citations_field(&map),
        },
        None if map.contains_key("citations") => StreamChunk::Citation {
            citations: citations_field(&map).unwrap_or_default(),
        },
        None => StreamChunk::Unrecognized(Value::Object(map)),
    }
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| map.get(*key))
        .map(value_as_text)
        .unwrap_or_default()
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn citations_field(map: &Map<String, Value>) -> Option<Vec<Citation>> {
    match map.get("citations")? {
        Value::Null => None,
        Value::Array(items) => Some(items.iter().map(citation).collect()),
        single => Some(vec![citation(single)]),
    }
}

fn citation(value: &Value) -> Citation {
    Citation::deserialize(value).unwrap_or_else(|_| Citation::Other(value.clone()))
}

fn error_message(map: &Map<String, Value>) -> String {
    for key in ["error", "message"] {
        match map.get(key) {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    return s.clone();
                }
            }
            _ => {}
        }
    }
    "Stream error".to_string()
}

fn code_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
