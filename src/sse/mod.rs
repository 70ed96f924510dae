//! SSE (Server-Sent Events) stream decoding
//!
//! The platform streams answers as lines of the form:
//! - `data: <json>` - a chunk payload
//! - `data: [DONE]` - end of stream
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `chunk` - The `StreamChunk` sum type and citation types
//! - `parser` - Line parsing and chunk classification
//! - `decoder` - Incremental UTF-8 decoding, line buffering and the `SseDecoder` driver

mod chunk;
mod decoder;
mod parser;

pub use chunk::{collect_text, Citation, CitationRef, StreamChunk};
pub use decoder::{decode_parts, LineBuffer, SseDecoder, Utf8Decoder};
pub use parser::{classify, parse_line, ParsedLine, DONE_SENTINEL};
