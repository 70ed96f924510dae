//! Streaming engine: one request, one pull loop, one terminal callback.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::handler::{ChannelHandler, StreamEvent, StreamHandler};
use super::StreamOutcome;
use crate::client::{race, ApiRequest, CustomGptClient, ACCEPT_EVENT_STREAM};
use crate::error::{classify_transport_error, error_from_body, ApiError, ApiResult};
use crate::registry::RegistryGuard;
use crate::sse::{SseDecoder, StreamChunk};
use crate::traits::HttpRequest;

/// How a stream ended successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    /// `[DONE]` or a `done` chunk.
    Done,
    /// Body ended without a done marker.
    EndOfBody,
}

enum Flow {
    Continue,
    Stop(Terminal),
}

impl CustomGptClient {
    /// Run a streaming request, delivering chunks to `handler`.
    ///
    /// Never retried. The timeout (stream timeout from the config unless
    /// overridden) covers the whole stream. Every failure, including
    /// cancellation through the registry or the request's cancel token, is
    /// reported once through [`StreamHandler::on_error`] and also returned.
    pub async fn stream<H>(&self, request: ApiRequest, handler: &mut H) -> StreamOutcome
    where
        H: StreamHandler + ?Sized,
    {
        let guard = self.registry().track(request.options.cancel.as_ref());
        handler.on_open(guard.id());

        let result = self.run_stream(request, &guard, handler).await;
        let id = guard.id().clone();
        drop(guard);

        match result {
            Ok(terminal) => {
                debug!(request_id = %id, ?terminal, "Stream completed");
                handler.on_complete();
                StreamOutcome::Completed
            }
            Err(err) => {
                warn!(
                    request_id = %id,
                    status = err.status,
                    kind = %err.kind,
                    error = %err.message,
                    "Stream failed"
                );
                handler.on_error(err.clone());
                StreamOutcome::Failed(err)
            }
        }
    }

    /// Run a stream on a background task, forwarding events over a channel.
    ///
    /// The first event is [`StreamEvent::Opened`] carrying the id to cancel
    /// with; the last is `Completed` or `Failed`.
    pub fn spawn_stream(
        &self,
        request: ApiRequest,
    ) -> (mpsc::UnboundedReceiver<StreamEvent>, JoinHandle<StreamOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();
        let task = tokio::spawn(async move {
            let mut handler = ChannelHandler::new(tx);
            client.stream(request, &mut handler).await
        });
        (rx, task)
    }

    async fn run_stream<H>(
        &self,
        request: ApiRequest,
        guard: &RegistryGuard,
        handler: &mut H,
    ) -> ApiResult<Terminal>
    where
        H: StreamHandler + ?Sized,
    {
        let ApiRequest {
            method,
            path,
            mut query,
            body,
            options,
        } = request;

        let lang = options
            .lang
            .unwrap_or_else(|| self.config().lang().to_string());
        query.push(("stream".to_string(), "true".to_string()));
        query.push(("lang".to_string(), lang));

        let url = self.build_url(&path, &query)?;
        let headers = self.headers(ACCEPT_EVENT_STREAM, &body);
        let timeout = options.timeout.unwrap_or(self.config().stream_timeout());
        let deadline = Instant::now() + timeout;
        let token = guard.token();

        info!(
            request_id = %guard.id(),
            method = %method,
            url = %url,
            api_key = %self.config().masked_api_key(),
            "Opening stream"
        );

        let http_request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let response = race(token, deadline, timeout, self.http().send_streaming(http_request))
            .await?
            .map_err(|e| classify_transport_error(&e, timeout))?;

        if !response.is_success() {
            let status = response.status;
            let text = race(token, deadline, timeout, response.text())
                .await?
                .map_err(|e| classify_transport_error(&e, timeout))?;
            return Err(error_from_body(status, &text));
        }

        let Some(mut body) = response.body else {
            return Err(ApiError::network("Response body is not readable"));
        };

        let mut decoder = SseDecoder::new();
        loop {
            match race(token, deadline, timeout, body.next()).await? {
                Some(Ok(bytes)) => decoder.push(&bytes),
                Some(Err(e)) => return Err(classify_transport_error(&e, timeout)),
                None => {
                    decoder.finish();
                    return match drain(&mut decoder, handler)? {
                        Flow::Stop(terminal) => Ok(terminal),
                        Flow::Continue => Ok(Terminal::EndOfBody),
                    };
                }
            }

            if let Flow::Stop(terminal) = drain(&mut decoder, handler)? {
                if decoder.dropped_lines() > 0 {
                    debug!(dropped = decoder.dropped_lines(), "Malformed stream lines dropped");
                }
                return Ok(terminal);
            }
        }
    }
}

/// Deliver every chunk buffered in `decoder`, stopping at a terminal one.
fn drain<H>(decoder: &mut SseDecoder, handler: &mut H) -> ApiResult<Flow>
where
    H: StreamHandler + ?Sized,
{
    while let Some(chunk) = decoder.next_chunk() {
        match chunk {
            StreamChunk::Done => return Ok(Flow::Stop(Terminal::Done)),
            StreamChunk::Error { message, code } => {
                let err = ApiError::stream(message);
                return Err(match code {
                    Some(code) => err.with_code(code),
                    None => err,
                });
            }
            chunk => handler.on_chunk(chunk),
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        opened: usize,
        chunks: Vec<StreamChunk>,
        completed: usize,
        errors: Vec<ApiError>,
    }

    impl StreamHandler for Recorder {
        fn on_open(&mut self, _id: &crate::registry::RequestId) {
            self.opened += 1;
        }
        fn on_chunk(&mut self, chunk: StreamChunk) {
            self.chunks.push(chunk);
        }
        fn on_complete(&mut self) {
            self.completed += 1;
        }
        fn on_error(&mut self, error: ApiError) {
            self.errors.push(error);
        }
    }

    impl Recorder {
        fn terminal_count(&self) -> usize {
            self.completed + self.errors.len()
        }
    }

    fn setup() -> (CustomGptClient, MockHttpClient) {
        let mock = MockHttpClient::new();
        let config = ClientConfig::builder("1234|abcdef")
            .base_url("https://api.test/v1")
            .stream_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        (
            CustomGptClient::with_http_client(config, Arc::new(mock.clone())),
            mock,
        )
    }

    fn request() -> ApiRequest {
        ApiRequest::post("/projects/1/conversations/abc/messages")
            .json(serde_json::json!({ "prompt": "hi" }))
    }

    fn parts(parts: &[&str]) -> Vec<Bytes> {
        parts.iter().map(|p| Bytes::from(p.to_string())).collect()
    }

    #[tokio::test]
    async fn test_split_content_then_done() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&[
            "data: {\"content\":\"Hel",
            "lo\"}\n\ndata: [DONE]\n",
        ])));

        let mut rec = Recorder::default();
        let outcome = client.stream(request(), &mut rec).await;

        assert!(outcome.is_completed());
        assert_eq!(rec.opened, 1);
        assert_eq!(
            rec.chunks,
            vec![StreamChunk::Content {
                text: "Hello".into(),
                citations: None
            }]
        );
        assert_eq!(rec.completed, 1);
        assert!(rec.errors.is_empty());
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_nothing_processed_after_done() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&[
            "data: {\"content\":\"a\"}\ndata: [DONE]\ndata: {\"content\":\"b\"}\ndata: {\"type\":\"error\",\"message\":\"late\"}\n",
        ])));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(rec.chunks.len(), 1);
        assert_eq!(rec.completed, 1);
        assert!(rec.errors.is_empty());
    }

    #[tokio::test]
    async fn test_request_shape() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&["data: [DONE]\n"])));

        let mut rec = Recorder::default();
        client.stream(request().lang("de"), &mut rec).await;

        let sent = &mock.get_requests()[0];
        assert!(sent.url.ends_with("/messages?stream=true&lang=de"));
        assert_eq!(sent.headers["Accept"], "text/event-stream");
        assert_eq!(sent.headers["Content-Type"], "application/json");
        assert_eq!(sent.headers["Authorization"], "Bearer 1234|abcdef");
    }

    #[tokio::test]
    async fn test_default_lang() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&["data: [DONE]\n"])));
        client.stream(request(), &mut Recorder::default()).await;
        assert!(mock.get_requests()[0].url.ends_with("stream=true&lang=en"));
    }

    #[tokio::test]
    async fn test_malformed_line_skipped() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&[
            "data: {not json}\n",
            "data: {\"content\":\"ok\"}\n",
        ])));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(rec.chunks.len(), 1);
        assert_eq!(rec.chunks[0].text(), Some("ok"));
        assert_eq!(rec.completed, 1);
    }

    #[tokio::test]
    async fn test_natural_end_completes() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&[
            "data: {\"citations\":[1,2]}\n",
            "data: {\"content\":\"tail\"}",
        ])));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(rec.chunks.len(), 2);
        assert_eq!(rec.chunks[1].text(), Some("tail"));
        assert_eq!(rec.completed, 1);
    }

    #[tokio::test]
    async fn test_error_chunk_reports_once() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Stream(parts(&[
            "data: {\"content\":\"x\"}\n",
            "data: {\"type\":\"error\",\"message\":\"quota exceeded\",\"code\":\"limit\"}\n",
            "data: [DONE]\n",
        ])));

        let mut rec = Recorder::default();
        let outcome = client.stream(request(), &mut rec).await;

        assert_eq!(rec.terminal_count(), 1);
        assert_eq!(rec.errors[0].kind, ErrorKind::Stream);
        assert_eq!(rec.errors[0].message, "quota exceeded");
        assert_eq!(rec.errors[0].code.as_deref(), Some("limit"));
        assert_eq!(outcome, StreamOutcome::Failed(rec.errors[0].clone()));
    }

    #[tokio::test]
    async fn test_http_error_not_read_as_stream() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::StreamWithStatus(
            401,
            parts(&["{\"message\":\"bad key\"}"]),
        ));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert!(rec.chunks.is_empty());
        assert_eq!(rec.terminal_count(), 1);
        assert_eq!(rec.errors[0].status, 401);
        assert_eq!(rec.errors[0].message, "bad key");
    }

    #[tokio::test]
    async fn test_missing_body_is_network_error() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::StreamWithoutBody);

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(rec.errors.len(), 1);
        assert_eq!(rec.errors[0].status, 0);
    }

    #[tokio::test]
    async fn test_read_error_mid_stream() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::StreamError(
            parts(&["data: {\"content\":\"a\"}\n"]),
            HttpError::Io("connection reset".into()),
        ));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(rec.chunks.len(), 1);
        assert_eq!(rec.completed, 0);
        assert_eq!(rec.errors.len(), 1);
        assert_eq!(rec.errors[0].status, 0);
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Success(Response::new(503, "down")));

        let mut rec = Recorder::default();
        client.stream(request(), &mut rec).await;
        assert_eq!(mock.get_requests().len(), 1);
        assert_eq!(rec.errors[0].status, 503);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_covers_whole_stream() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::StreamPending(parts(&[
            "data: {\"content\":\"a\"}\n",
        ])));

        let mut rec = Recorder::default();
        client
            .stream(request().timeout(Duration::from_secs(2)), &mut rec)
            .await;
        assert_eq!(rec.chunks.len(), 1);
        assert_eq!(rec.errors.len(), 1);
        assert!(rec.errors[0].is_timeout());
        assert_eq!(rec.errors[0].status, 408);
        assert_eq!(rec.completed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_stream() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::StreamPending(parts(&[
            "data: {\"content\":\"a\"}\n",
        ])));

        let (mut rx, task) = client.spawn_stream(request());
        let id = match rx.recv().await {
            Some(StreamEvent::Opened(id)) => id,
            other => panic!("expected Opened, got {:?}", other),
        };
        assert!(matches!(rx.recv().await, Some(StreamEvent::Chunk(_))));

        assert!(client.cancel(&id));
        match rx.recv().await {
            Some(StreamEvent::Failed(err)) => {
                assert!(err.is_cancelled());
                assert_eq!(err.status, 408);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(rx.recv().await.is_none());
        assert!(!task.await.unwrap().is_completed());
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_token_cancels() {
        let (client, mock) = setup();
        mock.set_default_response(MockResponse::Pending);
        let token = tokio_util::sync::CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let mut rec = Recorder::default();
        client
            .stream(request().cancel_token(token), &mut rec)
            .await;
        assert_eq!(rec.errors.len(), 1);
        assert!(rec.errors[0].is_cancelled());
    }
}
