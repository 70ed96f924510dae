//! Common test utilities for integration tests.
//!
//! Every test talks to a local wiremock server through the real reqwest
//! transport.

#![allow(dead_code)]

use std::time::Duration;

use customgpt::{ClientConfig, ClientConfigBuilder, CustomGptClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "123|testkey";

/// Config builder pointed at `server` with short timers.
pub fn config_for(server: &MockServer) -> ClientConfigBuilder {
    ClientConfig::builder(TEST_API_KEY)
        .base_url(server.uri())
        .timeout(Duration::from_secs(2))
        .stream_timeout(Duration::from_secs(2))
        .retry_attempts(3)
        .retry_delay(Duration::from_millis(5))
}

/// Client pointed at `server` with short timers.
pub fn client_for(server: &MockServer) -> CustomGptClient {
    CustomGptClient::new(config_for(server).build().unwrap())
}

/// Wrap `data` in the platform's response envelope.
pub fn envelope(data: Value) -> Value {
    json!({ "status": "success", "data": data })
}

/// Build an SSE body from `data:` payloads.
pub fn sse_body(payloads: &[&str]) -> String {
    payloads
        .iter()
        .map(|p| format!("data: {}\n\n", p))
        .collect()
}

/// Poll until `client` has `n` requests in flight.
pub async fn wait_for_in_flight(client: &CustomGptClient, n: usize) {
    for _ in 0..200 {
        if client.in_flight() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} requests in flight, found {}", n, client.in_flight());
}
