//! Conversation state management
//!
//! This module contains the state containers a chat session owns:
//! - ConversationLog: append-only history of finalized messages
//! - ResponseAssembler: per-turn state machine folding stream events into the
//!   live buffer and the final assistant message

mod assembler;
mod conversation;

pub use assembler::{AssemblerUpdate, ResponseAssembler, StreamSession, TurnOutcome, TurnState};
pub use conversation::ConversationLog;
