mod message;
mod request;

pub use message::{Message, MessageRole, CONNECTION_ERROR_PREFIX, ERROR_PREFIX};
pub use request::{ChatRequest, StatusResponse, STATUS_READY};
