//! Mock implementations for testing.
//!
//! Enables exercising the chat session without network access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses and streaming bodies

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
