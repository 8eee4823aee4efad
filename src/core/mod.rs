//! Session core: command encoding, event demultiplexing, audio assembly.
//!
//! # Architecture
//!
//! ```text
//! caller ──► commands ──► writer channel ──► socket
//! socket ──► receive loop ──► demux ──► ordered event stream ──► caller
//! ```
//!
//! Exactly one receive loop drains each socket, so events reach the caller
//! in strict receipt order.

pub mod assembly;
pub mod demux;
pub mod realtime;
pub mod tts;

use std::fmt;

// =============================================================================
// Connection state
// =============================================================================

/// Lifecycle state of a session's underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection exists
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Connected and exchanging frames
    Open,
    /// Graceful shutdown requested, close in flight
    Closing,
    /// Closed cleanly (by either side)
    Closed,
    /// Terminated by a transport failure
    Failed,
}

impl ConnectionState {
    /// Returns true if frames can currently be sent.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Returns true if the connection is finished and will not recover.
    /// Reconnection is always an explicit new `connect` call.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(ConnectionState::Open.is_open());
        assert!(!ConnectionState::Connecting.is_open());
        assert!(ConnectionState::Closed.is_terminal());
        assert!(ConnectionState::Failed.is_terminal());
        assert!(!ConnectionState::Open.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Open.to_string(), "open");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}
