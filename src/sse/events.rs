//! Stream event types and definitions
//!
//! Contains the StreamEvent enum with every event kind the assistant backend
//! emits during a chat turn, plus the line and error types used while decoding.

use serde::{Deserialize, Deserializer, Serialize};

/// Typed events from the assistant's `/chat/stream` endpoint.
///
/// The backend discriminates events by a `type` field in the JSON payload.
/// String fields the backend omits or sends as `null` decode as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress note from the backend ("Searching...", "thinking")
    Status {
        #[serde(default, deserialize_with = "null_as_empty")]
        message: String,
    },
    /// The full response text so far, not an increment
    TextDelta {
        #[serde(default, deserialize_with = "null_as_empty")]
        content: String,
    },
    /// A tool invocation started
    ToolStart {
        #[serde(default, deserialize_with = "null_as_empty")]
        tool_name: String,
    },
    /// The most recent tool invocation finished
    ToolComplete,
    /// The finished assistant response
    Final {
        #[serde(default, deserialize_with = "null_as_empty")]
        content: String,
    },
    /// Stream completed; clears the loading state
    Done,
    /// Backend-reported failure for this turn
    Error {
        #[serde(default, deserialize_with = "null_as_empty")]
        message: String,
    },
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// How an event affects the in-progress display buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Overwrite the buffer with the event's rendering
    Replace,
    /// Append the event's rendering to the buffer
    Append,
    /// Empty the buffer (the event finalizes a message)
    Clear,
    /// Leave the buffer untouched
    Keep,
}

impl StreamEvent {
    /// Returns the wire discriminant for this event.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::Status { .. } => "status",
            StreamEvent::TextDelta { .. } => "text_delta",
            StreamEvent::ToolStart { .. } => "tool_start",
            StreamEvent::ToolComplete => "tool_complete",
            StreamEvent::Final { .. } => "final",
            StreamEvent::Done => "done",
            StreamEvent::Error { .. } => "error",
        }
    }

    /// Declared effect of this event kind on the display buffer.
    pub fn buffer_policy(&self) -> BufferPolicy {
        match self {
            StreamEvent::Status { .. } | StreamEvent::TextDelta { .. } => BufferPolicy::Replace,
            StreamEvent::ToolStart { .. } | StreamEvent::ToolComplete => BufferPolicy::Append,
            StreamEvent::Final { .. } | StreamEvent::Error { .. } => BufferPolicy::Clear,
            StreamEvent::Done => BufferPolicy::Keep,
        }
    }

    /// Text this event contributes to the display buffer under its policy.
    ///
    /// Returns `None` for events that do not render into the buffer.
    pub fn render(&self) -> Option<String> {
        match self {
            StreamEvent::Status { message } => Some(format!("🔍 {}", message)),
            StreamEvent::TextDelta { content } => Some(content.clone()),
            StreamEvent::ToolStart { tool_name } => {
                Some(format!("\n\n🔧 Using tool: {}...", tool_name))
            }
            StreamEvent::ToolComplete => Some("\n✅ Tool completed".to_string()),
            StreamEvent::Final { .. } | StreamEvent::Done | StreamEvent::Error { .. } => None,
        }
    }

    /// True for events that end the read loop (`done`, `error`).
    pub fn closes_stream(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

/// A decoded event together with the envelope fields that rode along with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub event: StreamEvent,
    /// Backend trace identifier, when the backend sends one
    pub trace_id: Option<String>,
}

impl DecodedEvent {
    pub fn new(event: StreamEvent) -> Self {
        Self {
            event,
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<StreamEvent> for DecodedEvent {
    fn from(event: StreamEvent) -> Self {
        Self::new(event)
    }
}

/// Represents one classified line of the response body
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event record payload (the text after `data: `)
    Data(String),
    /// Empty line
    Empty,
    /// Anything else: comments, keep-alives, unknown fields
    Ignored(String),
}

/// Errors that can occur while decoding a single record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SseParseError {
    /// Payload is not valid JSON or does not match the event shape
    #[error("Invalid JSON for event '{event_type}': {detail}")]
    InvalidJson { event_type: String, detail: String },
    /// Payload is JSON but has no string `type` discriminant
    #[error("Event payload has no type field")]
    MissingType,
}
