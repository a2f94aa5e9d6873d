//! Chat session controller.
//!
//! Owns the conversation log and the per-turn assembler, and drives one
//! streamed response at a time from the backend to completion.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::AssistantClient;
use crate::error::{ClientResult, StreamError};
use crate::models::Message;
use crate::sse::{EventDecoder, FrameSplitter};
use crate::state::{AssemblerUpdate, ConversationLog, ResponseAssembler, StreamSession, TurnOutcome};
use crate::traits::ByteStream;

/// Updates pushed to the presentation layer while a session runs
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The live display buffer changed
    LiveBuffer(String),
    /// A message was appended to the conversation log
    MessageAppended(Message),
    /// A turn started (true) or ended (false)
    Busy(bool),
    /// Result of a connectivity probe
    Connection(bool),
    /// History was cleared
    Cleared,
}

/// Why a send never started a turn
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    EmptyMessage,
    #[error("a response is still streaming")]
    TurnInProgress,
    #[error("not connected to the backend")]
    Disconnected,
}

pub struct ChatSession {
    client: AssistantClient,
    log: ConversationLog,
    assembler: ResponseAssembler,
    connected: bool,
    updates: Option<mpsc::UnboundedSender<SessionUpdate>>,
}

impl ChatSession {
    /// Create a disconnected session; call [`check_status`](Self::check_status)
    /// before sending.
    pub fn new(client: AssistantClient) -> Self {
        Self {
            client,
            log: ConversationLog::new(),
            assembler: ResponseAssembler::new(),
            connected: false,
            updates: None,
        }
    }

    /// Subscribe a channel to session updates.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn session(&self) -> StreamSession {
        self.assembler.session()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_active(&self) -> bool {
        self.assembler.is_active()
    }

    fn emit(&self, update: SessionUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }

    /// Probe `/status` and update the connected flag.
    pub async fn check_status(&mut self) -> bool {
        let ready = self.client.is_ready().await;
        if ready != self.connected {
            tracing::info!(connected = ready, "Connection status changed");
        }
        self.connected = ready;
        self.emit(SessionUpdate::Connection(ready));
        ready
    }

    /// Start a turn without touching the network.
    ///
    /// Appends the trimmed user message and marks the session active.
    /// Returns the text to send.
    pub fn begin_turn(&mut self, text: &str) -> Result<String, SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::EmptyMessage);
        }
        if self.assembler.is_active() {
            return Err(SendRejected::TurnInProgress);
        }
        if !self.connected {
            return Err(SendRejected::Disconnected);
        }

        let message = Message::user(text);
        self.log.append(message.clone());
        self.assembler.begin();

        tracing::info!(message_id = %message.id(), "Turn started");
        self.emit(SessionUpdate::MessageAppended(message));
        self.emit(SessionUpdate::Busy(true));
        Ok(text.to_string())
    }

    /// Send a message and drive the response stream to completion.
    pub async fn send(&mut self, text: &str) -> Result<TurnOutcome, SendRejected> {
        self.send_with_cancel(text, CancellationToken::new()).await
    }

    /// Like [`send`](Self::send), but the turn ends as a connection error as
    /// soon as `cancel` fires.
    pub async fn send_with_cancel(
        &mut self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, SendRejected> {
        let message = self.begin_turn(text)?;
        self.drive(&message, &cancel).await;

        let (outcome, flipped) = self.assembler.finish();
        if flipped {
            self.emit(SessionUpdate::Busy(false));
        }
        tracing::info!(outcome = outcome_name(&outcome), "Turn finished");
        Ok(outcome)
    }

    async fn drive(&mut self, message: &str, cancel: &CancellationToken) {
        let client = self.client.clone();
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StreamError::Cancelled),
            result = client.open_stream(message) => result.map_err(StreamError::OpenFailed),
        };

        let stream = match opened {
            Ok(stream) => stream,
            Err(err) => {
                self.fault(err);
                return;
            }
        };

        if let Err(err) = self.read_events(stream, cancel).await {
            self.fault(err);
        }
    }

    /// Feed the body through splitter, decoder and assembler until the stream
    /// closes or a closing event arrives. The stream is dropped on return.
    async fn read_events(
        &mut self,
        mut stream: ByteStream,
        cancel: &CancellationToken,
    ) -> Result<(), StreamError> {
        let mut splitter = FrameSplitter::new();
        let mut decoder = EventDecoder::new();

        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                next = stream.next() => next,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Err(StreamError::ConnectionLost(e)),
                None => {
                    splitter.finish();
                    tracing::debug!(
                        malformed = decoder.malformed_count(),
                        "Stream ended"
                    );
                    return Ok(());
                }
            };

            for line in splitter.push(&bytes) {
                let Some(decoded) = decoder.decode_line(&line) else {
                    continue;
                };
                let closes = decoded.event.closes_stream();
                tracing::debug!(event = decoded.event.event_type_name(), "Stream event");

                let was_active = self.assembler.is_active();
                let update = self.assembler.apply(decoded, &mut self.log);
                self.publish(update, was_active);

                if closes {
                    return Ok(());
                }
            }
        }
    }

    fn fault(&mut self, err: StreamError) {
        tracing::warn!(code = err.error_code(), error = %err, "Stream failed");
        let was_active = self.assembler.is_active();
        let update = self.assembler.fail(&err.user_message(), &mut self.log);
        self.publish(update, was_active);
    }

    fn publish(&self, update: AssemblerUpdate, was_active: bool) {
        match update {
            AssemblerUpdate::Live(buffer) => self.emit(SessionUpdate::LiveBuffer(buffer)),
            AssemblerUpdate::Finalized(message) | AssemblerUpdate::Errored(message) => {
                self.emit(SessionUpdate::LiveBuffer(String::new()));
                self.emit(SessionUpdate::MessageAppended(message));
            }
            AssemblerUpdate::Closed | AssemblerUpdate::Ignored => {}
        }
        if was_active && !self.assembler.is_active() {
            self.emit(SessionUpdate::Busy(false));
        }
    }

    /// Clear history on the backend, then locally.
    ///
    /// On failure the local log is left untouched.
    pub async fn clear(&mut self) -> ClientResult<()> {
        match self.client.clear().await {
            Ok(()) => {
                self.log.clear();
                self.assembler.reset();
                tracing::info!("Conversation cleared");
                self.emit(SessionUpdate::Cleared);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear conversation");
                Err(e)
            }
        }
    }
}

fn outcome_name(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Finalized(_) => "finalized",
        TurnOutcome::Errored(_) => "errored",
        TurnOutcome::Dropped => "dropped",
    }
}
