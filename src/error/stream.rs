//! Turn-level streaming error types.
//!
//! These are the failures that end a chat turn from the client side:
//! the stream could not be opened, broke mid-way, or was cancelled.

use crate::traits::HttpError;

/// Failure that terminates an active turn.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    /// The request never produced a readable body.
    #[error("Failed to open stream: {0}")]
    OpenFailed(#[source] HttpError),

    /// Reading the body failed after the stream was open.
    #[error("Stream connection lost: {0}")]
    ConnectionLost(#[source] HttpError),

    /// The caller cancelled the turn.
    #[error("Stream cancelled")]
    Cancelled,
}

impl StreamError {
    /// Text shown to the user after the connection-error marker.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::OpenFailed(HttpError::ServerError { status, message }) => {
                if message.trim().is_empty() {
                    format!("server returned HTTP {}", status)
                } else {
                    format!("server returned HTTP {}: {}", status, message.trim())
                }
            }
            StreamError::OpenFailed(err) => err.to_string(),
            StreamError::ConnectionLost(err) => format!("stream interrupted ({})", err),
            StreamError::Cancelled => "request cancelled".to_string(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::OpenFailed(_) => "E_STREAM_OPEN",
            StreamError::ConnectionLost(_) => "E_STREAM_CONN",
            StreamError::Cancelled => "E_STREAM_CANCELLED",
        }
    }
}
