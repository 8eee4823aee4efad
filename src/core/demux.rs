//! Inbound event demultiplexer.
//!
//! Every frame read from a socket funnels through here, in receipt order,
//! and comes out the other side as exactly one [`SessionEvent`] on the
//! session's event stream (binary frames are the exception: they accumulate
//! silently until a terminal marker finalizes them into an
//! [`AudioArtifact`]).
//!
//! Classification rules:
//! - Binary frame → appended to the audio assembly buffer
//! - Text frame that is not valid JSON → [`SessionEvent::Protocol`]
//!   diagnostic; the session continues
//! - Recognized control event → [`SessionEvent::Event`]
//! - Recognized stream marker → `end` finalizes the buffered audio;
//!   `start`/`error` surface as [`SessionEvent::Stream`]
//! - Unrecognized JSON carrying a string `request_id` → treated as a
//!   terminal marker and finalizes the buffer
//! - Any other JSON → [`SessionEvent::Unclassified`], never dropped

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::assembly::AudioAssembler;
use super::realtime::events::ServerEvent;
use super::tts::messages::StreamMessage;
use crate::error::ProtocolError;
use crate::transport::{Frame, TransportError};

/// How many characters of a malformed frame to keep in the diagnostic.
const MALFORMED_SNIPPET_LEN: usize = 256;

// =============================================================================
// Events
// =============================================================================

/// A fully assembled audio result, produced when a terminal stream marker
/// arrives.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// Correlation id echoed by the terminal marker, when present
    pub request_id: Option<String>,
    /// The concatenated audio bytes, in arrival order
    pub data: Bytes,
}

/// Everything a session can surface to its consumer, in receipt order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The connection opened and the session is live
    Opened,
    /// A recognized control-channel event
    Event(ServerEvent),
    /// A recognized synthesis stream marker (start or error; end becomes
    /// an [`SessionEvent::Artifact`])
    Stream(StreamMessage),
    /// Valid JSON that matched no known shape. Surfaced verbatim so callers
    /// can observe protocol additions.
    Unclassified(Value),
    /// A malformed frame diagnostic. Non-fatal.
    Protocol(ProtocolError),
    /// Audio finalized by a terminal marker
    Artifact(AudioArtifact),
    /// The connection closed gracefully
    Closed,
    /// The connection was torn down by a transport failure
    TransportFailed(TransportError),
}

// =============================================================================
// Demultiplexer
// =============================================================================

/// Classifies inbound frames and pushes the resulting events, in order,
/// into the session's event channel.
pub struct Demultiplexer {
    assembler: AudioAssembler,
    sink: mpsc::Sender<SessionEvent>,
}

impl Demultiplexer {
    pub fn new(sink: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            assembler: AudioAssembler::new(),
            sink,
        }
    }

    /// Classifies one frame. Returns false once the consumer has dropped
    /// the event stream, which lets the receive loop stop early.
    pub async fn handle_frame(&mut self, frame: Frame) -> bool {
        match frame {
            Frame::Binary(data) => {
                trace!(bytes = data.len(), "buffering audio chunk");
                self.assembler.append(data);
                true
            }
            Frame::Text(text) => self.handle_text(&text).await,
        }
    }

    async fn handle_text(&mut self, text: &str) -> bool {
        let value: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "malformed inbound frame");
                return self
                    .emit(SessionEvent::Protocol(ProtocolError::MalformedFrame {
                        detail: e.to_string(),
                        raw: truncate_snippet(text),
                    }))
                    .await;
            }
        };

        if let Ok(event) = serde_json::from_value::<ServerEvent>(value.clone()) {
            return self.emit(SessionEvent::Event(event)).await;
        }

        if let Ok(message) = serde_json::from_value::<StreamMessage>(value.clone()) {
            return match message {
                StreamMessage::End { request_id, .. } => {
                    debug!(request_id = %request_id, "synthesis stream ended");
                    self.finalize_audio(Some(request_id)).await
                }
                other => self.emit(SessionEvent::Stream(other)).await,
            };
        }

        // Servers evolve their terminal markers; any otherwise-unrecognized
        // JSON that still carries a request_id closes out the stream.
        if let Some(request_id) = value.get("request_id").and_then(Value::as_str) {
            debug!(request_id = %request_id, "unrecognized terminal marker");
            let request_id = request_id.to_string();
            return self.finalize_audio(Some(request_id)).await;
        }

        debug!("unclassified inbound event");
        self.emit(SessionEvent::Unclassified(value)).await
    }

    async fn finalize_audio(&mut self, request_id: Option<String>) -> bool {
        let data = self.assembler.finalize();
        self.emit(SessionEvent::Artifact(AudioArtifact { request_id, data }))
            .await
    }

    /// Discards any partially buffered audio.
    pub fn reset(&mut self) {
        self.assembler.clear();
    }

    /// Announces that the connection is live.
    pub async fn opened(&self) -> bool {
        self.emit(SessionEvent::Opened).await
    }

    /// Announces a graceful close.
    pub async fn closed(&self) -> bool {
        self.emit(SessionEvent::Closed).await
    }

    /// Announces a terminal transport failure.
    pub async fn transport_failed(&self, error: TransportError) -> bool {
        self.emit(SessionEvent::TransportFailed(error)).await
    }

    async fn emit(&self, event: SessionEvent) -> bool {
        self.sink.send(event).await.is_ok()
    }
}

fn truncate_snippet(text: &str) -> String {
    if text.chars().count() <= MALFORMED_SNIPPET_LEN {
        text.to_string()
    } else {
        text.chars().take(MALFORMED_SNIPPET_LEN).collect()
    }
}

// =============================================================================
// Event stream
// =============================================================================

/// Ordered, pull-based stream of [`SessionEvent`]s for one connection.
///
/// Backed by a bounded channel fed exclusively by the session's receive
/// loop, so `next` yields events in exactly the order frames arrived.
pub struct EventStream {
    rx: mpsc::Receiver<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::Receiver<SessionEvent>) -> Self {
        Self { rx }
    }

    /// Awaits the next event. `None` once the connection is finished and
    /// every buffered event has been consumed.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll, mainly useful in tests.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        self.rx.try_recv().ok()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn demux_pair(capacity: usize) -> (Demultiplexer, EventStream) {
        let (tx, rx) = mpsc::channel(capacity);
        (Demultiplexer::new(tx), EventStream::new(rx))
    }

    #[tokio::test]
    async fn test_malformed_frame_becomes_diagnostic() {
        let (mut demux, mut events) = demux_pair(8);
        assert!(demux.handle_frame(Frame::Text("{not json".into())).await);

        match events.next().await {
            Some(SessionEvent::Protocol(ProtocolError::MalformedFrame { raw, .. })) => {
                assert_eq!(raw, "{not json");
            }
            other => panic!("expected protocol diagnostic, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_event_is_surfaced_not_dropped() {
        let (mut demux, mut events) = demux_pair(8);
        let frame = Frame::Text(r#"{"type":"session.brand_new_thing","detail":42}"#.into());
        assert!(demux.handle_frame(frame).await);

        match events.next().await {
            Some(SessionEvent::Unclassified(value)) => {
                assert_eq!(value["type"], "session.brand_new_thing");
                assert_eq!(value["detail"], 42);
            }
            other => panic!("expected unclassified event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_end_marker_finalizes_buffered_audio() {
        let (mut demux, mut events) = demux_pair(8);
        demux
            .handle_frame(Frame::Binary(Bytes::from(vec![7u8; 100])))
            .await;
        demux
            .handle_frame(Frame::Binary(Bytes::from(vec![8u8; 250])))
            .await;
        demux
            .handle_frame(Frame::Binary(Bytes::from(vec![9u8; 50])))
            .await;
        demux
            .handle_frame(Frame::Text(
                r#"{"type":"end","request_id":"req-1"}"#.into(),
            ))
            .await;

        match events.next().await {
            Some(SessionEvent::Artifact(artifact)) => {
                assert_eq!(artifact.request_id.as_deref(), Some("req-1"));
                assert_eq!(artifact.data.len(), 400);
            }
            other => panic!("expected artifact, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unrecognized_marker_with_request_id_finalizes() {
        let (mut demux, mut events) = demux_pair(8);
        demux
            .handle_frame(Frame::Binary(Bytes::from_static(b"pcm")))
            .await;
        demux
            .handle_frame(Frame::Text(
                r#"{"kind":"done","request_id":"req-9","elapsed_ms":12}"#.into(),
            ))
            .await;

        match events.next().await {
            Some(SessionEvent::Artifact(artifact)) => {
                assert_eq!(artifact.request_id.as_deref(), Some("req-9"));
                assert_eq!(artifact.data, Bytes::from_static(b"pcm"));
            }
            other => panic!("expected artifact, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_start_marker_does_not_finalize() {
        let (mut demux, mut events) = demux_pair(8);
        demux
            .handle_frame(Frame::Binary(Bytes::from_static(b"chunk")))
            .await;
        demux
            .handle_frame(Frame::Text(
                r#"{"type":"start","request_id":"req-2"}"#.into(),
            ))
            .await;

        match events.next().await {
            Some(SessionEvent::Stream(StreamMessage::Start { request_id, .. })) => {
                assert_eq!(request_id, "req-2");
            }
            other => panic!("expected stream start, got {other:?}"),
        }
        // The buffered audio is still pending.
        assert!(events.try_next().is_none());
    }

    #[tokio::test]
    async fn test_events_preserve_receipt_order() {
        let (mut demux, mut events) = demux_pair(16);
        demux
            .handle_frame(Frame::Text(r#"{"a":1}"#.into()))
            .await;
        demux.handle_frame(Frame::Text("oops".into())).await;
        demux
            .handle_frame(Frame::Text(r#"{"b":2}"#.into()))
            .await;

        assert!(matches!(
            events.next().await,
            Some(SessionEvent::Unclassified(_))
        ));
        assert!(matches!(
            events.next().await,
            Some(SessionEvent::Protocol(_))
        ));
        assert!(matches!(
            events.next().await,
            Some(SessionEvent::Unclassified(_))
        ));
    }

    #[test]
    fn test_snippet_truncation() {
        let long = "x".repeat(1000);
        assert_eq!(truncate_snippet(&long).len(), MALFORMED_SNIPPET_LEN);
        assert_eq!(truncate_snippet("short"), "short");
    }
}
