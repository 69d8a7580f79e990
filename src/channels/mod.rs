//! Transports that carry chat turns to the orchestrator.

pub mod ws;

pub use ws::{ServerMessage, chat_routes};
