//! Error types shared across the SDK.
//!
//! Each distinct failure mode gets its own typed error so callers can
//! branch on it: connection establishment ([`ConnectError`]),
//! command serialization ([`EncodeError`]), mid-stream transport failures
//! ([`crate::transport::TransportError`]), malformed server frames
//! ([`ProtocolError`], surfaced as diagnostic events rather than thrown),
//! the one-shot authentication exchange ([`AuthError`]), and operations on a
//! session in the wrong state ([`SessionError`]).

use thiserror::Error;

use crate::transport::TransportError;

// =============================================================================
// Connect / Encode / Protocol
// =============================================================================

/// Errors establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The endpoint could not be parsed into a valid URL
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The socket failed to open (handshake rejected, network unreachable,
    /// TLS failure)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The one-shot authentication exchange failed
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors serializing an outbound command.
///
/// Not expected in normal operation: command structs are built from owned
/// UTF-8 strings and plain numbers. Kept typed so an unrepresentable payload
/// is a recoverable failure, not a panic.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The command could not be serialized to JSON
    #[error("command serialization failed: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for EncodeError {
    fn from(err: serde_json::Error) -> Self {
        EncodeError::Serialize(err.to_string())
    }
}

/// A malformed or unexpected server frame.
///
/// Recovered locally: the demultiplexer reports it once on the event stream
/// and keeps the receive loop running.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    /// A text frame that is not valid JSON
    #[error("malformed server frame: {detail}")]
    MalformedFrame {
        /// Parser diagnostic
        detail: String,
        /// The offending payload, truncated for logging
        raw: String,
    },
}

// =============================================================================
// Authentication
// =============================================================================

/// Errors from the one-shot HTTP authentication exchange.
///
/// The three server-rejection shapes are distinct on purpose: callers need
/// to branch on "bad credentials" vs "another operation is already running"
/// vs "server-side failure".
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials rejected (HTTP 401)
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// A conflicting operation is already in progress (HTTP 403)
    #[error("conflicting active operation: {0}")]
    Conflict(String),

    /// Any other non-success status, with the server's message when present
    #[error("auth server error (status {status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message parsed from the response body, or a generic fallback
        message: String,
    },

    /// The HTTP request itself failed (DNS, connect, TLS)
    #[error("auth request failed: {0}")]
    Http(String),

    /// A 200 response whose body could not be interpreted
    #[error("malformed auth response: {0}")]
    MalformedResponse(String),
}

// =============================================================================
// Session
// =============================================================================

/// Errors from public session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Operation attempted while not connected
    #[error("not connected")]
    NotConnected,

    /// Invalid caller-supplied configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Connection establishment failed
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Outbound command serialization failed
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The transport failed mid-stream
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server reported a synthesis failure
    #[error("synthesis failed: {message}")]
    Synthesis {
        /// Server-supplied error message
        message: String,
        /// Server-supplied error code, when present
        code: Option<String>,
    },

    /// The caller-supplied deadline elapsed before the artifact arrived
    #[error("timed out waiting for synthesis to complete")]
    Timeout,

    /// The connection ended before the expected artifact was delivered
    #[error("connection closed before the artifact was delivered")]
    StreamEnded,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::NotConnected;
        assert_eq!(err.to_string(), "not connected");

        let err = AuthError::Conflict("note generation in progress".to_string());
        assert!(err.to_string().contains("conflicting active operation"));

        let err = AuthError::Server {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_encode_error_from_serde() {
        // A parse error is the easiest serde_json::Error to manufacture.
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let encode: EncodeError = err.into();
        assert!(encode.to_string().contains("serialization failed"));
    }

    #[test]
    fn test_transport_error_propagates_into_session_error() {
        let err: SessionError = TransportError::Io("reset by peer".to_string()).into();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[test]
    fn test_connect_error_from_auth() {
        let err: ConnectError = AuthError::Rejected("bad key".to_string()).into();
        assert!(matches!(err, ConnectError::Auth(AuthError::Rejected(_))));
    }
}
