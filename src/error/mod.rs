//! Error types for chatwire.
//!
//! | Failure | Type | Surfaced as |
//! |---------|------|-------------|
//! | Malformed record | [`crate::sse::SseParseError`] | logged, record skipped |
//! | Backend `error` event | [`crate::sse::StreamEvent::Error`] | `❌ Error:` message |
//! | Stream open/read fault, cancel | [`StreamError`] | `❌ Connection error:` message |
//! | Status / clear call | [`ClientError`] | connection indicator or log line |
//! | Bad configuration | [`crate::config::ConfigError`] | start-up failure |

mod client;
mod stream;

pub use client::ClientError;
pub use stream::StreamError;

/// Result type for AssistantClient operations
pub type ClientResult<T> = Result<T, ClientError>;
