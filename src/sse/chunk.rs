//! Typed stream chunks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A source reference attached to streamed content.
///
/// The platform sends either bare numeric citation ids or small objects;
/// anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Citation {
    Id(i64),
    Reference(CitationRef),
    Other(Value),
}

/// Object form of a citation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CitationRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One parsed unit of a response stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Incremental answer text, optionally with the citations it relies on.
    Content {
        text: String,
        citations: Option<Vec<Citation>>,
    },
    /// Citations sent on their own, usually after the content.
    Citation { citations: Vec<Citation> },
    /// End of stream (`data: [DONE]` or an explicit `done` object).
    Done,
    /// Error reported by the server inside the stream.
    Error {
        message: String,
        code: Option<String>,
    },
    /// Valid JSON of a shape this client does not know; left for the caller.
    Unrecognized(Value),
}

impl StreamChunk {
    /// Returns the chunk type name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            StreamChunk::Content { .. } => "content",
            StreamChunk::Citation { .. } => "citation",
            StreamChunk::Done => "done",
            StreamChunk::Error { .. } => "error",
            StreamChunk::Unrecognized(_) => "unrecognized",
        }
    }

    /// Whether this chunk ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done | StreamChunk::Error { .. })
    }

    /// Content text, if this is a content chunk.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamChunk::Content { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Concatenate the text of all content chunks.
pub fn collect_text<'a>(chunks: impl IntoIterator<Item = &'a StreamChunk>) -> String {
    chunks.into_iter().filter_map(StreamChunk::text).collect()
}
