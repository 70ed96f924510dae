//! Receivers for streamed chunks.

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::ApiError;
use crate::registry::RequestId;
use crate::sse::StreamChunk;

/// Receives the events of one stream.
///
/// `on_chunk` is called in server order for every content, citation and
/// unrecognized chunk. Exactly one of `on_complete` or `on_error` is called
/// last, and nothing is called after it.
pub trait StreamHandler: Send {
    /// Called once the stream is registered, before the request is sent.
    fn on_open(&mut self, _id: &RequestId) {}

    fn on_chunk(&mut self, chunk: StreamChunk);

    fn on_complete(&mut self);

    fn on_error(&mut self, error: ApiError);
}

type OpenFn<'a> = Box<dyn FnMut(&RequestId) + Send + 'a>;
type ChunkFn<'a> = Box<dyn FnMut(StreamChunk) + Send + 'a>;
type CompleteFn<'a> = Box<dyn FnMut() + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnMut(ApiError) + Send + 'a>;

/// [`StreamHandler`] built from closures.
///
/// ```ignore
/// let mut answer = String::new();
/// let mut handler = StreamCallbacks::new(|chunk| {
///     if let Some(text) = chunk.text() {
///         answer.push_str(text);
///     }
/// })
/// .with_error(|err| eprintln!("{}", err));
/// client.stream(request, &mut handler).await;
/// ```
pub struct StreamCallbacks<'a> {
    open: Option<OpenFn<'a>>,
    chunk: ChunkFn<'a>,
    complete: Option<CompleteFn<'a>>,
    error: Option<ErrorFn<'a>>,
}

impl<'a> StreamCallbacks<'a> {
    pub fn new(on_chunk: impl FnMut(StreamChunk) + Send + 'a) -> Self {
        Self {
            open: None,
            chunk: Box::new(on_chunk),
            complete: None,
            error: None,
        }
    }

    pub fn with_open(mut self, f: impl FnMut(&RequestId) + Send + 'a) -> Self {
        self.open = Some(Box::new(f));
        self
    }

    pub fn with_complete(mut self, f: impl FnMut() + Send + 'a) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl FnMut(ApiError) + Send + 'a) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl StreamHandler for StreamCallbacks<'_> {
    fn on_open(&mut self, id: &RequestId) {
        if let Some(f) = self.open.as_mut() {
            f(id);
        }
    }

    fn on_chunk(&mut self, chunk: StreamChunk) {
        (self.chunk)(chunk);
    }

    fn on_complete(&mut self) {
        if let Some(f) = self.complete.as_mut() {
            f();
        }
    }

    fn on_error(&mut self, error: ApiError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }
}

/// Stream events forwarded over a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Opened(RequestId),
    Chunk(StreamChunk),
    Completed,
    Failed(ApiError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed | StreamEvent::Failed(_))
    }
}

/// Forwards every callback as a [`StreamEvent`].
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl ChannelHandler {
    pub fn new(tx: mpsc::UnboundedSender<StreamEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            trace!("Stream receiver dropped");
        }
    }
}

impl StreamHandler for ChannelHandler {
    fn on_open(&mut self, id: &RequestId) {
        self.send(StreamEvent::Opened(id.clone()));
    }

    fn on_chunk(&mut self, chunk: StreamChunk) {
        self.send(StreamEvent::Chunk(chunk));
    }

    fn on_complete(&mut self) {
        self.send(StreamEvent::Completed);
    }

    fn on_error(&mut self, error: ApiError) {
        self.send(StreamEvent::Failed(error));
    }
}
