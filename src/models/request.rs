//! Request and response bodies for the backend endpoints.

use serde::{Deserialize, Serialize};

/// Status value meaning the backend can take chat requests
pub const STATUS_READY: &str = "ready";

/// Body of `POST /chat/stream`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `GET /status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    /// Whether the backend reports itself ready
    pub fn is_ready(&self) -> bool {
        self.status == STATUS_READY
    }
}
