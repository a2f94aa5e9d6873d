//! Conversation messages and their roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Prefix of an assistant message produced from a backend `error` event
pub const ERROR_PREFIX: &str = "❌ Error: ";
/// Prefix of an assistant message produced from a transport fault
pub const CONNECTION_ERROR_PREFIX: &str = "❌ Connection error: ";

/// A finalized conversation message.
///
/// Fields are private: once a Message exists it is never edited, the
/// conversation log only appends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    id: Uuid,
    role: MessageRole,
    content: String,
    created_at: DateTime<Utc>,
    /// Backend trace identifier of the turn that produced this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Message {
    fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            created_at: Utc::now(),
            trace_id: None,
        }
    }

    /// A message typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into())
    }

    /// A finished assistant response
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content.into())
    }

    /// Assistant message for a backend-reported error
    pub fn assistant_error(message: &str) -> Self {
        Self::assistant(format!("{}{}", ERROR_PREFIX, message))
    }

    /// Assistant message for a transport fault
    pub fn connection_error(detail: &str) -> Self {
        Self::assistant(format!("{}{}", CONNECTION_ERROR_PREFIX, detail))
    }

    /// Attach the backend trace id (builder, before the message is logged)
    pub fn with_trace_id(mut self, trace_id: Option<String>) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// True for assistant messages carrying either error marker
    pub fn is_error(&self) -> bool {
        self.role == MessageRole::Assistant
            && (self.content.starts_with(ERROR_PREFIX)
                || self.content.starts_with(CONNECTION_ERROR_PREFIX))
    }
}
