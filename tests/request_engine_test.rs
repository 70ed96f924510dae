//! Integration tests for the buffered request engine: headers, query
//! building, error extraction, retry and timeouts.

mod common;

use std::time::Duration;

use common::{client_for, config_for, TEST_API_KEY};
use customgpt::{ApiRequest, CustomGptClient, ErrorKind, RetryMode, RetryPolicy};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_sends_auth_and_json_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/projects/1/conversations"))
        .and(header("authorization", format!("Bearer {}", TEST_API_KEY).as_str()))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let value: Value = client
        .execute(ApiRequest::post("/projects/1/conversations").json(json!({"name": "x"})))
        .await
        .unwrap();

    assert_eq!(value, json!({"ok": true}));
    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({"name": "x"}));
}

#[tokio::test]
async fn test_omits_unset_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let _: Value = client
        .execute(
            ApiRequest::get("/projects")
                .query("page", Some(2))
                .query("name", None::<&str>),
        )
        .await
        .unwrap();
    let _: Value = client
        .execute(ApiRequest::get("/projects").query("page", None::<u32>))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("page=2"));
    assert_eq!(requests[1].url.query(), None);
}

#[tokio::test]
async fn test_retries_server_errors_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .execute::<Value>(ApiRequest::get("/user"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Http);
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "boom");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_succeeds_on_second_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let value: Value = client.execute(ApiRequest::get("/user")).await.unwrap();

    assert_eq!(value, json!({"id": 1}));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_default_mode_retries_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": "error", "data": {"message": "Agent not found"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .execute::<Value>(ApiRequest::get("/projects/9"))
        .await
        .unwrap_err();

    assert_eq!(err.status, 404);
    assert_eq!(err.message, "Agent not found");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_transient_only_mode_skips_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/9"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let policy =
        RetryPolicy::new(3, Duration::from_millis(5)).with_mode(RetryMode::TransientOnly);
    let err = client
        .execute::<Value>(ApiRequest::get("/projects/9").retry(policy))
        .await
        .unwrap_err();

    assert_eq!(err.status, 404);
    assert_eq!(err.message, "missing");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_error_body_uses_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .execute::<Value>(ApiRequest::delete("/projects/1").retry(RetryPolicy::no_retry()))
        .await
        .unwrap_err();

    assert_eq!(err.status, 401);
    assert_eq!(err.message, "HTTP 401");
}

#[tokio::test]
async fn test_timeout_reports_408_and_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server)
        .timeout(Duration::from_millis(100))
        .retry_attempts(2)
        .build()
        .unwrap();
    let client = CustomGptClient::new(config);
    let err = client
        .execute::<Value>(ApiRequest::get("/user"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.status, 408);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_per_request_timeout_overrides_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .execute::<Value>(
            ApiRequest::get("/user")
                .timeout(Duration::from_millis(50))
                .retry(RetryPolicy::no_retry()),
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let config = customgpt::ClientConfig::builder(TEST_API_KEY)
        .base_url("http://127.0.0.1:1")
        .retry_attempts(1)
        .build()
        .unwrap();

    let client = CustomGptClient::new(config);
    let err = client
        .execute::<Value>(ApiRequest::get("/user"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.status, 0);
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .execute::<Value>(ApiRequest::get("/user").retry(RetryPolicy::no_retry()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Decode);
    assert_eq!(err.status, 0);
}
