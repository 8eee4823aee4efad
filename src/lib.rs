//! speechlink: a client SDK for realtime speech services.
//!
//! The crate talks to two WebSocket-based speech/AI services:
//!
//! - A **realtime conversation channel** driven by JSON control events
//!   (`session.update`, `conversation.item.create`, `input_audio_buffer.*`,
//!   `response.create`, ...), exposed through [`RealtimeSession`].
//! - A **streaming TTS channel** where a one-shot HTTP auth exchange returns
//!   a socket URL, one JSON command requests synthesis, and the server
//!   streams binary audio chunks terminated by a JSON marker carrying the
//!   `request_id`. Exposed through [`TtsClient`].
//!
//! Both channels share the same plumbing: a [`transport::Transport`]
//! abstraction over the socket, an inbound [`Demultiplexer`] that classifies
//! frames and assembles fragmented audio, and a single ordered
//! [`EventStream`] on which control events, diagnostics, completed audio
//! artifacts, and connection open/close notifications are delivered.
//!
//! # Example
//!
//! ```rust,ignore
//! use speechlink::{RealtimeConfig, RealtimeSession, SessionEvent};
//! use speechlink::transport::WsTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RealtimeConfig::new("sk-...");
//!     let mut session = RealtimeSession::new(config, Arc::new(WsTransport::new()));
//!     session.connect().await?;
//!
//!     let mut events = session.events().expect("stream available after connect");
//!     session.send_text("Hello there").await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event {
//!             SessionEvent::Event(ev) => println!("server event: {ev:?}"),
//!             SessionEvent::Closed => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod error;
pub mod transport;

// Re-export commonly used items for convenience
pub use crate::core::ConnectionState;
pub use crate::core::assembly::AudioAssembler;
pub use crate::core::demux::{AudioArtifact, Demultiplexer, EventStream, SessionEvent};
pub use crate::core::realtime::commands::{ClientCommand, EventIdGenerator, SessionConfig};
pub use crate::core::realtime::events::ServerEvent;
pub use crate::core::realtime::{RealtimeConfig, RealtimeSession};
pub use crate::core::tts::messages::{StreamMessage, SynthesisCommand};
pub use crate::core::tts::{OutputFormat, TtsClient, TtsConfig};
pub use crate::error::{
    AuthError, ConnectError, EncodeError, ProtocolError, SessionError, SessionResult,
};
pub use crate::transport::{Frame, Transport, TransportError};
