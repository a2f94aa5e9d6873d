//! Stream record parsing logic
//!
//! Classifies body lines, turns `data: ` records into typed events and wraps
//! both steps in the stateless-per-line EventDecoder.

use serde::Deserialize;

use crate::sse::events::{DecodedEvent, SseLine, SseParseError, StreamEvent};

/// Literal prefix of an event record
pub const DATA_PREFIX: &str = "data: ";

/// Event kinds this client understands
const KNOWN_EVENT_TYPES: &[&str] = &[
    "status",
    "text_delta",
    "tool_start",
    "tool_complete",
    "final",
    "done",
    "error",
];

/// Envelope fields shared by every event payload
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: Option<String>,
    /// Any JSON value; only strings are kept
    #[serde(default)]
    trace_id: Option<serde_json::Value>,
}

impl Envelope {
    fn trace_id(&self) -> Option<String> {
        match &self.trace_id {
            Some(serde_json::Value::String(id)) => Some(id.clone()),
            _ => None,
        }
    }
}

/// Classify a single body line
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) => SseLine::Data(payload.to_string()),
        None => SseLine::Ignored(line.to_string()),
    }
}

/// Parse a record payload into a typed event
///
/// Returns:
/// - `Ok(Some(event))` - A known event was decoded
/// - `Ok(None)` - Valid payload with an event type this client does not know
/// - `Err(error)` - Malformed payload
pub fn parse_stream_event(data: &str) -> Result<Option<DecodedEvent>, SseParseError> {
    let value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
            event_type: "unknown".to_string(),
            detail: e.to_string(),
        })?;

    let envelope = Envelope::deserialize(&value).map_err(|e| SseParseError::InvalidJson {
        event_type: "unknown".to_string(),
        detail: e.to_string(),
    })?;

    let trace_id = envelope.trace_id();
    let event_type = envelope.event_type.ok_or(SseParseError::MissingType)?;
    if !KNOWN_EVENT_TYPES.contains(&event_type.as_str()) {
        tracing::debug!(event_type = %event_type, "Ignoring unknown stream event type");
        return Ok(None);
    }

    let event = StreamEvent::deserialize(&value).map_err(|e| SseParseError::InvalidJson {
        event_type: event_type.clone(),
        detail: e.to_string(),
    })?;

    Ok(Some(DecodedEvent {
        event,
        trace_id,
    }))
}

/// Turns body lines into events, skipping everything that is not one.
#[derive(Debug, Default)]
pub struct EventDecoder {
    /// Records that failed to parse so far
    malformed: usize,
}

impl EventDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line.
    ///
    /// Non-record lines, unknown event kinds and malformed payloads all yield
    /// `None`; malformed payloads are logged and counted, never propagated.
    pub fn decode_line(&mut self, line: &str) -> Option<DecodedEvent> {
        let data = match parse_sse_line(line) {
            SseLine::Data(data) => data,
            SseLine::Empty => return None,
            SseLine::Ignored(other) => {
                tracing::trace!(line = %other, "Ignoring non-record line");
                return None;
            }
        };

        match parse_stream_event(&data) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.malformed += 1;
                tracing::warn!(error = %e, "Error parsing event data");
                None
            }
        }
    }

    /// Decode a batch of lines in order
    pub fn decode_lines<I, S>(&mut self, lines: I) -> Vec<DecodedEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| self.decode_line(line.as_ref()))
            .collect()
    }

    /// Number of malformed records skipped so far
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }
}
