//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let mock = MockHttpClient::new();
//! mock.set_response(STREAM_URL, MockResponse::Stream(vec![sse_body(&[done()])]));
//! let mut session = connected_session(&mock).await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use chatwire::adapters::mock::{MockHttpClient, MockResponse};
use chatwire::client::AssistantClient;
use chatwire::config::ClientConfig;
use chatwire::session::{ChatSession, SessionUpdate};
use chatwire::traits::Response;
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub const BASE_URL: &str = "http://assistant.test";
pub const STATUS_URL: &str = "http://assistant.test/status";
pub const STREAM_URL: &str = "http://assistant.test/chat/stream";
pub const CLEAR_URL: &str = "http://assistant.test/chat/clear";

/// Session over the mock client, not yet connected.
pub fn mock_session(mock: &MockHttpClient) -> ChatSession {
    let config = ClientConfig::new()
        .with_base_url(BASE_URL)
        .expect("valid base url");
    ChatSession::new(AssistantClient::with_http(config, Arc::new(mock.clone())))
}

/// Session whose status probe reported ready.
pub async fn connected_session(mock: &MockHttpClient) -> ChatSession {
    mock.set_response(
        STATUS_URL,
        MockResponse::Success(Response::new(200, Bytes::from(r#"{"status":"ready"}"#))),
    );
    let mut session = mock_session(mock);
    assert!(session.check_status().await, "status probe should succeed");
    session
}

/// Join event JSON values into a `data: ` record body.
pub fn sse_body(events: &[Value]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n", event))
        .collect()
}

/// Cut a body into chunks of at most `size` bytes, ignoring char boundaries.
pub fn chunked(body: &str, size: usize) -> Vec<Bytes> {
    body.as_bytes()
        .chunks(size)
        .map(Bytes::copy_from_slice)
        .collect()
}

pub fn drain_updates(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) -> Vec<SessionUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

pub fn status(message: &str) -> Value {
    json!({"type": "status", "message": message})
}

pub fn text_delta(content: &str) -> Value {
    json!({"type": "text_delta", "content": content})
}

pub fn tool_start(tool_name: &str) -> Value {
    json!({"type": "tool_start", "tool_name": tool_name})
}

pub fn tool_complete() -> Value {
    json!({"type": "tool_complete"})
}

pub fn final_message(content: &str) -> Value {
    json!({"type": "final", "content": content})
}

pub fn error(message: &str) -> Value {
    json!({"type": "error", "message": message})
}

pub fn done() -> Value {
    json!({"type": "done"})
}
