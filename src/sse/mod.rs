//! Chat stream decoding
//!
//! The assistant backend answers `POST /chat/stream` with a body of
//! newline-delimited records:
//! - `data: <json>` - an event record, `<json>` carries a `type` discriminant
//! - anything else - comments, keep-alives, blank lines (ignored)
//!
//! # Module structure
//! - `events` - Event type definitions (StreamEvent, BufferPolicy, SseLine, SseParseError)
//! - `splitter` - Byte chunks to lines (FrameSplitter)
//! - `parser` - Lines to events (EventDecoder, parse_sse_line, parse_stream_event)

mod events;
mod parser;
mod splitter;

// Re-export public types
pub use events::{BufferPolicy, DecodedEvent, SseLine, SseParseError, StreamEvent};
pub use parser::{parse_sse_line, parse_stream_event, EventDecoder, DATA_PREFIX};
pub use splitter::FrameSplitter;
