//! chatwire - streaming chat client for an assistant backend
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod sse;
pub mod state;
pub mod traits;
