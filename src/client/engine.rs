//! Buffered request engine: timeout, retry and error classification.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{race, ApiRequest, CustomGptClient, ACCEPT_JSON};
use crate::error::{classify_transport_error, error_from_body, ApiResult};
use crate::registry::RequestId;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::traits::{HttpRequest, Response};

impl CustomGptClient {
    /// Execute one logical request and decode its JSON response.
    ///
    /// The whole sequence, backoff sleeps included, holds one registry entry,
    /// so cancelling it by id or with `cancel_all` stops further attempts.
    /// Each attempt gets its own timeout. Failures are retried per the
    /// request's [`RetryPolicy`] (the config's by default); the last
    /// attempt's error is returned unchanged.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let ApiRequest {
            method,
            path,
            query,
            body,
            options,
        } = request;

        let url = self.build_url(&path, &query)?;
        let headers = self.headers(ACCEPT_JSON, &body);
        let timeout = options.timeout.unwrap_or(self.config().timeout());
        let policy = options
            .retry
            .unwrap_or_else(|| RetryPolicy::from_config(self.config()));
        let sequence = self.registry().track(options.cancel.as_ref());
        let cancel = sequence.token();
        let request_id = sequence.id();

        let http_request = HttpRequest {
            method,
            url,
            headers,
            body,
        };
        let http_request = &http_request;

        let result = retry_with_backoff(&policy, Some(cancel), move |attempt| {
            self.attempt(http_request, request_id, attempt, timeout, cancel)
        })
        .await;
        result
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        request: &HttpRequest,
        request_id: &RequestId,
        attempt: u32,
        timeout: Duration,
        sequence: &CancellationToken,
    ) -> ApiResult<T> {
        let token = sequence.child_token();
        debug!(
            request_id = %request_id,
            method = %request.method,
            url = %request.url,
            attempt,
            api_key = %self.config().masked_api_key(),
            "Sending request"
        );

        let started = std::time::Instant::now();
        let deadline = Instant::now() + timeout;
        let result = race(
            &token,
            deadline,
            timeout,
            self.http().send(request.clone()),
        )
        .await
        .and_then(|result| result.map_err(|e| classify_transport_error(&e, timeout)));

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    request_id = %request_id,
                    url = %request.url,
                    attempt,
                    status = err.status,
                    kind = %err.kind,
                    error = %err.message,
                    "Request failed"
                );
                return Err(err);
            }
        };

        debug!(
            request_id = %request_id,
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received response"
        );

        if !response.is_success() {
            let err = error_from_body(response.status, &response.text_lossy());
            warn!(
                request_id = %request_id,
                url = %request.url,
                attempt,
                status = err.status,
                error = %err.message,
                "Request returned error status"
            );
            return Err(err);
        }

        decode_json(&response)
    }
}

/// Decode a 2xx body. An empty body decodes as JSON `null`.
fn decode_json<T: DeserializeOwned>(response: &Response) -> ApiResult<T> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }
    Ok(serde_json::from_slice(&response.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::config::ClientConfig;
    use crate::error::ErrorKind;
    use crate::traits::HttpError;
    use serde_json::Value;
    use std::sync::Arc;

    const BASE: &str = "https://api.test/v1";

    fn setup(attempts: u32) -> (CustomGptClient, MockHttpClient) {
        let mock = MockHttpClient::new();
        let config = ClientConfig::builder("1234|abcdef")
            .base_url(BASE)
            .retry_attempts(attempts)
            .retry_delay(Duration::from_millis(10))
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        (
            CustomGptClient::with_http_client(config, Arc::new(mock.clone())),
            mock,
        )
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Option<Value> = decode_json(&Response::new(204, "")).unwrap();
        assert!(value.is_none());
        let err = decode_json::<Value>(&Response::new(200, "not json")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode);
        assert_eq!(err.status, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_status_0() {
        let (client, mock) = setup(2);
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".into(),
        )));

        let err = client
            .execute::<Value>(ApiRequest::get("/user"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 0);
        assert_eq!(err.kind, ErrorKind::Network);
        assert_eq!(mock.get_requests().len(), 2);
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_408_and_retried() {
        let (client, mock) = setup(3);
        mock.set_default_response(MockResponse::Pending);

        let err = client
            .execute::<Value>(ApiRequest::get("/user"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 408);
        assert!(err.is_timeout());
        assert_eq!(mock.get_requests().len(), 3);
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts() {
        let (client, mock) = setup(3);
        mock.set_response(
            &format!("{}/projects", BASE),
            MockResponse::Success(Response::new(500, r#"{"message":"down"}"#)),
        );

        let err = client
            .execute::<Value>(ApiRequest::get("/projects"))
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "down");

        let requests = mock.get_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].at - requests[0].at, Duration::from_millis(20));
        assert_eq!(requests[2].at - requests[1].at, Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_failures() {
        let (client, mock) = setup(3);
        let url = format!("{}/user", BASE);
        mock.push_response(&url, MockResponse::Success(Response::new(502, "")));
        mock.push_response(&url, MockResponse::Success(Response::new(200, r#"{"id":1}"#)));

        let value: Value = client.execute(ApiRequest::get("/user")).await.unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(mock.get_requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_call_retry_override() {
        let (client, mock) = setup(3);
        mock.set_default_response(MockResponse::Success(Response::new(500, "boom")));

        let err = client
            .execute::<Value>(ApiRequest::get("/user").retry(RetryPolicy::no_retry()))
            .await
            .unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(mock.get_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_entry_while_in_flight() {
        let (client, mock) = setup(1);
        mock.set_default_response(MockResponse::Pending);

        let task = tokio::spawn({
            let client = client.clone();
            async move { client.execute::<Value>(ApiRequest::get("/user")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(client.in_flight(), 1);

        assert_eq!(client.cancel_all(), 1);
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(err.status, 408);
        assert_eq!(client.in_flight(), 0);
        assert_eq!(mock.get_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_during_backoff() {
        let mock = MockHttpClient::new();
        let config = ClientConfig::builder("1234|abcdef")
            .base_url(BASE)
            .retry_attempts(3)
            .retry_delay(Duration::from_millis(100))
            .build()
            .unwrap();
        let client = CustomGptClient::with_http_client(config, Arc::new(mock.clone()));
        mock.set_default_response(MockResponse::Success(Response::new(500, "boom")));

        let task = tokio::spawn({
            let client = client.clone();
            async move { client.execute::<Value>(ApiRequest::get("/user")).await }
        });
        // First attempt fails at once; the 200ms backoff is now running.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(mock.get_requests().len(), 1);
        assert_eq!(client.in_flight(), 1);

        assert_eq!(client.cancel_all(), 1);
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(client.in_flight(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(mock.get_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_entry_across_attempts() {
        let (client, mock) = setup(3);
        mock.set_default_response(MockResponse::Pending);

        let task = tokio::spawn({
            let client = client.clone();
            async move { client.execute::<Value>(ApiRequest::get("/user")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let ids = client.registry().ids();
        assert_eq!(ids.len(), 1);

        // Past the first timeout and into the second attempt.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(mock.get_requests().len(), 2);
        assert_eq!(client.registry().ids(), ids);

        assert!(client.cancel(&ids[0]));
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(mock.get_requests().len(), 2);
    }
}
