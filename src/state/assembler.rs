//! Response assembly state machine.
//!
//! Folds the ordered events of one turn into the live display buffer and at
//! most one finalized assistant message.
//!
//! ```text
//!            begin()
//!   Idle ─────────────▶ Streaming(buf) ──status/text_delta──▶ buf = render
//!    ▲                    │  │  │       ──tool_start/complete─▶ buf += render
//!    │ done               │  │  └─done──────────────────────▶ Idle
//!    │                    │  └─final─▶ Finalized ──done──────▶ Idle
//!    └────────────────────┴─error─▶ Errored
//! ```

use crate::models::Message;
use crate::sse::{BufferPolicy, DecodedEvent, StreamEvent};
use crate::state::ConversationLog;

/// Where the current turn is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn in progress
    #[default]
    Idle,
    /// Events are arriving; holds the live display buffer
    Streaming(String),
    /// A `final` event produced the assistant message
    Finalized,
    /// An `error` event or transport fault produced an error message
    Errored,
}

impl TurnState {
    /// Finalized and Errored end a turn's message production
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Finalized | TurnState::Errored)
    }
}

/// Snapshot of the per-request state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSession {
    pub display_buffer: String,
    pub active: bool,
}

/// What applying one event did
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblerUpdate {
    /// The display buffer changed; carries its new contents
    Live(String),
    /// An assistant message was appended to the log
    Finalized(Message),
    /// An error message was appended to the log
    Errored(Message),
    /// The stream signalled completion
    Closed,
    /// The event had no effect in the current state
    Ignored,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// `final` delivered the assistant message
    Finalized(Message),
    /// An error message was logged instead
    Errored(Message),
    /// The stream closed with neither; the partial buffer was dropped
    Dropped,
}

impl TurnOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            TurnOutcome::Finalized(message) | TurnOutcome::Errored(message) => Some(message),
            TurnOutcome::Dropped => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResponseAssembler {
    state: TurnState,
    active: bool,
    trace_id: Option<String>,
    /// Message produced this turn, kept for the outcome
    produced: Option<TurnOutcome>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new turn: empty buffer, active session.
    pub fn begin(&mut self) {
        self.state = TurnState::Streaming(String::new());
        self.active = true;
        self.trace_id = None;
        self.produced = None;
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current live text; empty outside of Streaming
    pub fn display_buffer(&self) -> &str {
        match &self.state {
            TurnState::Streaming(buffer) => buffer,
            _ => "",
        }
    }

    pub fn session(&self) -> StreamSession {
        StreamSession {
            display_buffer: self.display_buffer().to_string(),
            active: self.active,
        }
    }

    /// Apply one decoded event, appending to `log` when it finalizes a message.
    pub fn apply(&mut self, decoded: DecodedEvent, log: &mut ConversationLog) -> AssemblerUpdate {
        if decoded.trace_id.is_some() {
            self.trace_id = decoded.trace_id;
        }
        let event = decoded.event;

        match std::mem::take(&mut self.state) {
            TurnState::Streaming(buffer) => self.apply_streaming(buffer, event, log),
            TurnState::Finalized => self.apply_after_final(event),
            TurnState::Errored => {
                self.state = TurnState::Errored;
                if event == StreamEvent::Done {
                    self.state = TurnState::Idle;
                    return AssemblerUpdate::Closed;
                }
                tracing::debug!(event = event.event_type_name(), "Ignoring event after error");
                AssemblerUpdate::Ignored
            }
            TurnState::Idle => {
                tracing::debug!(event = event.event_type_name(), "Ignoring event with no turn");
                AssemblerUpdate::Ignored
            }
        }
    }

    fn apply_streaming(
        &mut self,
        mut buffer: String,
        event: StreamEvent,
        log: &mut ConversationLog,
    ) -> AssemblerUpdate {
        match event {
            StreamEvent::Status { .. }
            | StreamEvent::TextDelta { .. }
            | StreamEvent::ToolStart { .. }
            | StreamEvent::ToolComplete => {
                apply_policy(&mut buffer, &event);
                self.state = TurnState::Streaming(buffer.clone());
                AssemblerUpdate::Live(buffer)
            }
            StreamEvent::Final { content } => {
                let message = Message::assistant(content).with_trace_id(self.trace_id.clone());
                log.append(message.clone());
                self.state = TurnState::Finalized;
                self.produced = Some(TurnOutcome::Finalized(message.clone()));
                AssemblerUpdate::Finalized(message)
            }
            StreamEvent::Error { message } => {
                let message =
                    Message::assistant_error(&message).with_trace_id(self.trace_id.clone());
                self.error_out(message, log)
            }
            StreamEvent::Done => {
                // Stream finished without a final message; the buffer goes with it
                if !buffer.is_empty() {
                    tracing::debug!(len = buffer.len(), "Done before final, dropping buffer");
                }
                self.state = TurnState::Idle;
                self.mark_inactive();
                AssemblerUpdate::Closed
            }
        }
    }

    fn apply_after_final(&mut self, event: StreamEvent) -> AssemblerUpdate {
        match event {
            StreamEvent::Done => {
                self.state = TurnState::Idle;
                self.mark_inactive();
                AssemblerUpdate::Closed
            }
            StreamEvent::Error { message } => {
                tracing::warn!(error = %message, "Backend error after final message, not logged");
                self.state = TurnState::Idle;
                self.mark_inactive();
                AssemblerUpdate::Closed
            }
            StreamEvent::Final { .. } => {
                tracing::warn!("Duplicate final event ignored");
                self.state = TurnState::Finalized;
                AssemblerUpdate::Ignored
            }
            StreamEvent::Status { .. }
            | StreamEvent::TextDelta { .. }
            | StreamEvent::ToolStart { .. }
            | StreamEvent::ToolComplete => {
                self.state = TurnState::Finalized;
                AssemblerUpdate::Ignored
            }
        }
    }

    /// A transport fault ends the turn like an `error` event would.
    ///
    /// If the turn already produced its message, nothing more is logged.
    pub fn fail(&mut self, detail: &str, log: &mut ConversationLog) -> AssemblerUpdate {
        match self.state {
            TurnState::Streaming(_) => {
                let message = Message::connection_error(detail).with_trace_id(self.trace_id.clone());
                self.error_out(message, log)
            }
            _ => {
                tracing::warn!(error = %detail, "Transport fault after turn completed");
                self.state = TurnState::Idle;
                self.mark_inactive();
                AssemblerUpdate::Closed
            }
        }
    }

    fn error_out(&mut self, message: Message, log: &mut ConversationLog) -> AssemblerUpdate {
        log.append(message.clone());
        self.state = TurnState::Errored;
        self.mark_inactive();
        self.produced = Some(TurnOutcome::Errored(message.clone()));
        AssemblerUpdate::Errored(message)
    }

    /// Close out the turn after the byte stream is gone.
    ///
    /// Returns the outcome and whether this call is what flipped the session
    /// to inactive (false if `done`/`error` already did).
    pub fn finish(&mut self) -> (TurnOutcome, bool) {
        if let TurnState::Streaming(buffer) = &self.state {
            if !buffer.is_empty() {
                tracing::info!(
                    len = buffer.len(),
                    "Stream closed without final message, dropping partial response"
                );
            }
        }
        self.state = TurnState::Idle;
        let flipped = self.mark_inactive();
        let outcome = self.produced.take().unwrap_or(TurnOutcome::Dropped);
        (outcome, flipped)
    }

    /// Forget the buffer without touching the log (history cleared)
    pub fn reset(&mut self) {
        if let TurnState::Streaming(buffer) = &mut self.state {
            buffer.clear();
        }
    }

    fn mark_inactive(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

fn apply_policy(buffer: &mut String, event: &StreamEvent) {
    let Some(rendered) = event.render() else {
        return;
    };
    match event.buffer_policy() {
        BufferPolicy::Replace => *buffer = rendered,
        BufferPolicy::Append => buffer.push_str(&rendered),
        BufferPolicy::Clear => buffer.clear(),
        BufferPolicy::Keep => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn status(message: &str) -> DecodedEvent {
        StreamEvent::Status {
            message: message.to_string(),
        }
        .into()
    }

    fn delta(content: &str) -> DecodedEvent {
        StreamEvent::TextDelta {
            content: content.to_string(),
        }
        .into()
    }

    fn tool_start(name: &str) -> DecodedEvent {
        StreamEvent::ToolStart {
            tool_name: name.to_string(),
        }
        .into()
    }

    fn final_msg(content: &str) -> DecodedEvent {
        StreamEvent::Final {
            content: content.to_string(),
        }
        .into()
    }

    fn error(message: &str) -> DecodedEvent {
        StreamEvent::Error {
            message: message.to_string(),
        }
        .into()
    }

    fn run(events: Vec<DecodedEvent>) -> (ResponseAssembler, ConversationLog) {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        assembler.begin();
        for event in events {
            assembler.apply(event, &mut log);
        }
        (assembler, log)
    }

    #[test]
    fn test_begin_starts_streaming_with_empty_buffer() {
        let mut assembler = ResponseAssembler::new();
        assert_eq!(assembler.state(), &TurnState::Idle);
        assert!(!assembler.is_active());

        assembler.begin();
        assert_eq!(assembler.state(), &TurnState::Streaming(String::new()));
        assert!(assembler.is_active());
    }

    #[test]
    fn test_text_delta_is_a_snapshot() {
        let (assembler, log) = run(vec![delta("a"), delta("ab"), delta("abc")]);
        assert_eq!(assembler.display_buffer(), "abc");
        assert!(log.is_empty());
    }

    #[test]
    fn test_status_replaces_buffer() {
        let (assembler, _) = run(vec![delta("draft"), status("Searching the web")]);
        assert_eq!(assembler.display_buffer(), "🔍 Searching the web");
    }

    #[test]
    fn test_tool_markers_append() {
        let (assembler, _) = run(vec![
            status("thinking"),
            tool_start("search"),
            StreamEvent::ToolComplete.into(),
        ]);
        assert_eq!(
            assembler.display_buffer(),
            "🔍 thinking\n\n🔧 Using tool: search...\n✅ Tool completed"
        );
    }

    #[test]
    fn test_live_update_carries_buffer() {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        assembler.begin();
        let update = assembler.apply(status("thinking"), &mut log);
        assert_eq!(update, AssemblerUpdate::Live("🔍 thinking".to_string()));
    }

    #[test]
    fn test_finalization_sequence() {
        let (mut assembler, log) = run(vec![
            status("thinking"),
            tool_start("search"),
            StreamEvent::ToolComplete.into(),
            final_msg("Result: 42"),
            StreamEvent::Done.into(),
        ]);

        assert_eq!(log.len(), 1);
        let message = log.last().unwrap();
        assert_eq!(message.role(), MessageRole::Assistant);
        assert_eq!(message.content(), "Result: 42");
        assert_eq!(assembler.display_buffer(), "");
        assert!(!assembler.is_active());
        assert_eq!(assembler.state(), &TurnState::Idle);

        let (outcome, flipped) = assembler.finish();
        assert!(matches!(outcome, TurnOutcome::Finalized(ref m) if m.content() == "Result: 42"));
        assert!(!flipped, "done already marked the session inactive");
    }

    #[test]
    fn test_final_keeps_session_active_until_done() {
        let (assembler, _) = run(vec![final_msg("answer")]);
        assert_eq!(assembler.state(), &TurnState::Finalized);
        assert!(assembler.is_active());
    }

    #[test]
    fn test_error_finalization() {
        let (mut assembler, log) = run(vec![status("thinking"), error("backend down")]);

        assert_eq!(log.len(), 1);
        let message = log.last().unwrap();
        assert!(message.content().contains("backend down"));
        assert!(message.content().starts_with("❌ Error: "));
        assert!(!assembler.is_active());
        assert_eq!(assembler.state(), &TurnState::Errored);
        assert_eq!(assembler.display_buffer(), "");

        let (outcome, flipped) = assembler.finish();
        assert!(matches!(outcome, TurnOutcome::Errored(_)));
        assert!(!flipped);
    }

    #[test]
    fn test_done_without_final_appends_nothing() {
        let (assembler, log) = run(vec![delta("partial"), StreamEvent::Done.into()]);
        assert!(log.is_empty());
        assert!(!assembler.is_active());
        assert_eq!(assembler.display_buffer(), "");
    }

    #[test]
    fn test_clean_close_without_final_drops_buffer() {
        let (mut assembler, log) = run(vec![status("thinking")]);
        assert!(assembler.is_active());

        let (outcome, flipped) = assembler.finish();
        assert_eq!(outcome, TurnOutcome::Dropped);
        assert!(flipped);
        assert!(log.is_empty());
        assert!(!assembler.is_active());
        assert_eq!(assembler.display_buffer(), "");
    }

    #[test]
    fn test_second_final_is_not_logged() {
        let (_, log) = run(vec![final_msg("one"), final_msg("two")]);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().unwrap().content(), "one");
    }

    #[test]
    fn test_error_after_final_is_not_logged() {
        let (assembler, log) = run(vec![final_msg("one"), error("late")]);
        assert_eq!(log.len(), 1);
        assert!(!assembler.is_active());
    }

    #[test]
    fn test_content_after_final_is_ignored() {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        assembler.begin();
        assembler.apply(final_msg("done"), &mut log);
        let update = assembler.apply(delta("stray"), &mut log);
        assert_eq!(update, AssemblerUpdate::Ignored);
        assert_eq!(assembler.display_buffer(), "");
    }

    #[test]
    fn test_transport_fault_while_streaming() {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        assembler.begin();
        assembler.apply(delta("half"), &mut log);

        let update = assembler.fail("connection reset", &mut log);
        assert!(matches!(update, AssemblerUpdate::Errored(_)));
        assert_eq!(
            log.last().unwrap().content(),
            "❌ Connection error: connection reset"
        );
        assert!(!assembler.is_active());
    }

    #[test]
    fn test_transport_fault_after_final_logs_nothing_more() {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        assembler.begin();
        assembler.apply(final_msg("answer"), &mut log);
        assembler.fail("connection reset", &mut log);
        assert_eq!(log.len(), 1);
        assert!(!assembler.is_active());
    }

    #[test]
    fn test_trace_id_attached_to_final_message() {
        let (_, log) = run(vec![
            status("thinking").with_trace_id("tr-42"),
            final_msg("answer"),
        ]);
        assert_eq!(log.last().unwrap().trace_id(), Some("tr-42"));
    }

    #[test]
    fn test_events_without_turn_are_ignored() {
        let mut assembler = ResponseAssembler::new();
        let mut log = ConversationLog::new();
        let update = assembler.apply(final_msg("orphan"), &mut log);
        assert_eq!(update, AssemblerUpdate::Ignored);
        assert!(log.is_empty());
    }

    #[test]
    fn test_begin_resets_previous_turn() {
        let (mut assembler, _) = run(vec![delta("old")]);
        assembler.finish();
        assembler.begin();
        assert_eq!(assembler.display_buffer(), "");
        assert!(assembler.is_active());
    }
}
