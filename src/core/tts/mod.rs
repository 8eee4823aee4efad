//! Text-to-speech synthesis channel.
//!
//! Single-shot flow: an HTTP auth exchange yields a short-lived WebSocket
//! URL, one JSON command describes the synthesis, the server streams binary
//! audio chunks, and a JSON terminal marker carrying the request id closes
//! the stream out.

pub mod auth;
pub mod client;
pub mod config;
pub mod messages;

pub use client::TtsClient;
pub use config::{OutputFormat, TtsConfig};
pub use messages::{StreamMessage, SynthesisCommand};

/// Default auth endpoint that vends per-connection WebSocket URLs.
pub const TTS_WS_AUTH_URL: &str = "https://api.play.ht/api/v4/websocket-auth";

/// Upper bound on synthesis input, in characters.
pub const MAX_TEXT_LENGTH: usize = 20_000;
