//! Bidirectional message-socket abstraction.
//!
//! The session core depends only on the [`Transport`] / [`Connection`] pair,
//! never on a concrete socket library. Production code uses the
//! tokio-tungstenite implementation in [`websocket`]; tests drive the core
//! with channel-backed fakes.

pub mod websocket;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

pub use websocket::WsTransport;

// =============================================================================
// Frame
// =============================================================================

/// One discrete unit read from or written to the socket.
///
/// Text frames carry JSON control messages; binary frames carry raw audio
/// bytes with no framing header. A frame is consumed exactly once: parsed as
/// JSON or appended to the audio assembly buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A UTF-8 text payload (JSON on both protocols)
    Text(String),
    /// A raw binary payload (audio chunk)
    Binary(Bytes),
}

impl Frame {
    /// Returns true if this is a text frame.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Frame::Text(_))
    }

    /// Returns true if this is a binary frame.
    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(self, Frame::Binary(_))
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(s) => s.len(),
            Frame::Binary(b) => b.len(),
        }
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Transport-level failures.
///
/// Graceful remote closure is *not* an error: `Connection::receive` signals
/// it by returning `None`. Abnormal closure (non-normal close code) and
/// mid-stream I/O failures are.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The opening handshake failed (rejected upgrade, TLS failure,
    /// unreachable host)
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// A read or write failed mid-stream
    #[error("transport I/O error: {0}")]
    Io(String),

    /// The peer closed the connection with a non-normal close code
    #[error("connection closed abnormally (code {code}): {reason}")]
    AbnormalClose {
        /// WebSocket close code
        code: u16,
        /// Close reason supplied by the peer, possibly empty
        reason: String,
    },
}

// =============================================================================
// Traits
// =============================================================================

/// Opens sockets. One implementation per socket technology.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a socket to `url`, attaching `headers` to the handshake
    /// request.
    async fn open(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> Result<Box<dyn Connection>, TransportError>;
}

/// A single open socket.
///
/// Reads happen exclusively from the session's receive-loop task; writes are
/// serialized through that same task, so implementations do not need
/// internal locking.
#[async_trait]
pub trait Connection: Send {
    /// Sends one frame. Resolves when the frame is handed to the transport,
    /// not when it is acknowledged.
    async fn send(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Awaits the next frame.
    ///
    /// `None` means the peer closed gracefully; `Some(Err(_))` is a terminal
    /// transport failure. After either, no further calls are expected.
    async fn receive(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Requests a graceful close with a normal-closure code. Idempotent.
    async fn close(&mut self) -> Result<(), TransportError>;
}

// =============================================================================
// Tests
// =============================================================================
