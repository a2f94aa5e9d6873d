//! Errors from the non-streaming backend calls.

use crate::config::ConfigError;
use crate::traits::HttpError;

/// Error type for AssistantClient operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Server returned an error status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
    /// Client could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),
}
