//! Conversational realtime channel.
//!
//! A bidirectional JSON control protocol over one WebSocket: the client
//! sends tagged command objects (session updates, conversation items, audio
//! buffer operations, response control) and the server streams back tagged
//! events that [`crate::core::demux`] fans out in receipt order.

pub mod commands;
pub mod config;
pub mod events;
pub mod session;

pub use commands::{ClientCommand, EventIdGenerator, SessionConfig};
pub use config::RealtimeConfig;
pub use events::ServerEvent;
pub use session::RealtimeSession;

/// Default realtime endpoint.
pub const REALTIME_WS_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default realtime model.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";
