//! Incremental decoding of a raw byte stream into chunks.
//!
//! Bytes arrive in arbitrary pieces: a multi-byte character or a line may be
//! split across reads. [`Utf8Decoder`] carries incomplete sequences over to
//! the next read and [`LineBuffer`] holds the trailing partial line, so the
//! chunks produced never depend on where the network split the body.

use tracing::{trace, warn};

use super::chunk::StreamChunk;
use super::parser::{parse_line, ParsedLine};

/// Longest payload excerpt included in a warning for a malformed line.
const MALFORMED_PREVIEW_CHARS: usize = 200;

/// Stateful UTF-8 decoder that tolerates sequences split across reads.
///
/// Invalid bytes are replaced with U+FFFD rather than failing the stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next piece, keeping an incomplete trailing sequence for later.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut out = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        out.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush bytes left over at end of input.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }

    /// Number of bytes waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Accumulates text and hands out complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Pop the next complete line without its `\n` / `\r\n` terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.find('\n')?;
        let line: String = self.buffer.drain(..=newline_pos).collect();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Take the unterminated fragment, if any.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// The text still waiting for a newline.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Bytes in, [`StreamChunk`]s out.
///
/// Lines are parsed lazily, one per [`next_chunk`](Self::next_chunk) call, so
/// nothing after a terminal chunk is ever parsed. Malformed lines are logged
/// and dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
    dropped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next raw piece of the body.
    pub fn push(&mut self, bytes: &[u8]) {
        let text = self.utf8.decode(bytes);
        self.lines.push(&text);
    }

    /// Mark end of input: flush the decoder and terminate the last line.
    pub fn finish(&mut self) {
        let tail = self.utf8.finish();
        self.lines.push(&tail);
        if let Some(remainder) = self.lines.take_remainder() {
            self.lines.push(&remainder);
            self.lines.push("\n");
        }
    }

    /// Next chunk from the complete lines buffered so far.
    pub fn next_chunk(&mut self) -> Option<StreamChunk> {
        while let Some(line) = self.lines.next_line() {
            match parse_line(&line) {
                ParsedLine::Skip => continue,
                ParsedLine::Chunk(chunk) => {
                    trace!(chunk_type = chunk.type_name(), "Parsed stream chunk");
                    return Some(chunk);
                }
                ParsedLine::Malformed { payload, error } => {
                    self.dropped += 1;
                    let preview: String = payload.chars().take(MALFORMED_PREVIEW_CHARS).collect();
                    warn!(%error, payload = %preview, "Dropping malformed stream line");
                }
            }
        }
        None
    }

    /// Count of malformed lines dropped so far.
    pub fn dropped_lines(&self) -> usize {
        self.dropped
    }
}

/// Decode a body delivered as `parts`, stopping after the first terminal chunk.
///
/// Mirrors what the streaming engine delivers and is handy for tests and
/// offline replays of captured streams.
pub fn decode_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Vec<StreamChunk> {
    let mut decoder = SseDecoder::new();
    let mut chunks = Vec::new();

    for part in parts {
        decoder.push(part);
        while let Some(chunk) = decoder.next_chunk() {
            let terminal = chunk.is_terminal();
            chunks.push(chunk);
            if terminal {
                return chunks;
            }
        }
    }

    decoder.finish();
    while let Some(chunk) = decoder.next_chunk() {
        let terminal = chunk.is_terminal();
        chunks.push(chunk);
        if terminal {
            break;
        }
    }
    chunks
}
