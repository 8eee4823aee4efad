//! Realtime session façade.
//!
//! Owns one socket at a time and exactly one receive loop per socket. All
//! writes funnel through the same spawned task that drains the socket, so
//! commands leave in the order their `send_*` futures complete and inbound
//! events surface in strict receipt order on the [`EventStream`].
//!
//! There is no automatic reconnection: when the connection ends, the stream
//! yields a terminal event and the caller decides whether to call
//! [`RealtimeSession::connect`] again.
//!
//! # Example
//!
//! ```no_run
//! use speechlink::{RealtimeConfig, RealtimeSession, SessionEvent};
//! use speechlink::transport::WsTransport;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RealtimeConfig::new("sk-...").with_voice("alloy");
//! let mut session = RealtimeSession::new(config, Arc::new(WsTransport::new()));
//! session.connect().await?;
//! let mut events = session.events().ok_or("stream already taken")?;
//!
//! session.send_text("Hello!").await?;
//! while let Some(event) = events.next().await {
//!     if matches!(event, SessionEvent::Closed | SessionEvent::TransportFailed(_)) {
//!         break;
//!     }
//! }
//! session.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::commands::{ClientCommand, ConversationItem, EventIdGenerator, ResponseConfig, SessionConfig};
use super::config::RealtimeConfig;
use crate::core::ConnectionState;
use crate::core::demux::{Demultiplexer, EventStream};
use crate::error::{SessionError, SessionResult};
use crate::transport::{Connection, Frame, Transport};

/// Event channel depth. The receive loop backpressures the socket when the
/// consumer falls this far behind.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Writer channel depth.
const WRITER_CHANNEL_CAPACITY: usize = 64;

/// How long `disconnect` waits for the receive loop to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

enum WriterRequest {
    Frame(Frame),
    Shutdown,
}

/// A conversational realtime session over one WebSocket.
pub struct RealtimeSession {
    config: RealtimeConfig,
    transport: Arc<dyn Transport>,
    ids: Arc<EventIdGenerator>,
    state: Arc<RwLock<ConnectionState>>,
    connected: Arc<AtomicBool>,
    writer: Option<mpsc::Sender<WriterRequest>>,
    task: Option<JoinHandle<()>>,
    events: Option<EventStream>,
}

impl RealtimeSession {
    pub fn new(config: RealtimeConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            ids: Arc::new(EventIdGenerator::new()),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            connected: Arc::new(AtomicBool::new(false)),
            writer: None,
            task: None,
            events: None,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the socket, starts the receive loop, and applies the initial
    /// session parameters.
    ///
    /// If a previous connection is still up it is closed first; at no point
    /// do two sockets belong to the same session.
    pub async fn connect(&mut self) -> SessionResult<()> {
        self.config.validate()?;
        if self.writer.is_some() {
            debug!("closing previous connection before reconnecting");
            self.disconnect().await?;
        }

        // Resolve everything fallible-but-local before touching the state,
        // so every failure from here on leaves the session Disconnected.
        let url = self.config.build_url().map_err(SessionError::from)?;
        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key),
            ),
            ("OpenAI-Beta".to_string(), "realtime=v1".to_string()),
        ];

        *self.state.write().await = ConnectionState::Connecting;
        let conn = match self.transport.open(&url, &headers).await {
            Ok(conn) => conn,
            Err(e) => {
                *self.state.write().await = ConnectionState::Disconnected;
                return Err(SessionError::Transport(e));
            }
        };
        info!(model = %self.config.model, "realtime session connected");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (writer_tx, writer_rx) = mpsc::channel(WRITER_CHANNEL_CAPACITY);
        let demux = Demultiplexer::new(event_tx);

        // Announce liveness before any inbound frame can race it onto the
        // stream.
        demux.opened().await;

        *self.state.write().await = ConnectionState::Open;
        self.connected.store(true, Ordering::SeqCst);

        let state = Arc::clone(&self.state);
        let connected = Arc::clone(&self.connected);
        self.task = Some(tokio::spawn(run_loop(
            conn, writer_rx, demux, state, connected,
        )));
        self.writer = Some(writer_tx);
        self.events = Some(EventStream::new(event_rx));

        self.update_session(self.config.initial_session()).await?;
        Ok(())
    }

    /// Closes the connection gracefully. Calling this while disconnected is
    /// a no-op.
    pub async fn disconnect(&mut self) -> SessionResult<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        {
            // The loop may already have finished on its own (peer close or
            // transport failure); its terminal state stands.
            let mut state = self.state.write().await;
            if !state.is_terminal() {
                *state = ConnectionState::Closing;
            }
        }

        // A send failure here just means the loop already exited and there
        // is nothing left to shut down.
        let _ = writer.send(WriterRequest::Shutdown).await;

        if let Some(task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await.is_err() {
                warn!("receive loop did not stop in time");
            }
        }

        {
            // If the loop never got to record its own end state, the session
            // still must finish in a terminal one.
            let mut state = self.state.write().await;
            if !state.is_terminal() {
                *state = ConnectionState::Closed;
            }
        }
        self.connected.store(false, Ordering::SeqCst);
        info!("realtime session disconnected");
        Ok(())
    }

    /// Takes the ordered event stream. Yields `Some` exactly once per
    /// connection.
    pub fn events(&mut self) -> Option<EventStream> {
        self.events.take()
    }

    /// Cheap liveness check, usable from synchronous contexts.
    pub fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Replaces mutable session parameters.
    pub async fn update_session(&self, session: SessionConfig) -> SessionResult<String> {
        self.send_command(ClientCommand::SessionUpdate {
            event_id: self.ids.next_id(),
            session,
        })
        .await
    }

    /// Inserts a user text message and immediately requests a response.
    /// Returns the event ids of both commands, in send order.
    pub async fn send_text(&self, text: impl Into<String>) -> SessionResult<(String, String)> {
        let item_id = self
            .send_command(ClientCommand::user_text(&self.ids, text))
            .await?;
        let response_id = self.create_response(None).await?;
        Ok((item_id, response_id))
    }

    /// Inserts an arbitrary conversation item.
    pub async fn create_item(
        &self,
        item: ConversationItem,
        previous_item_id: Option<String>,
    ) -> SessionResult<String> {
        self.send_command(ClientCommand::ConversationItemCreate {
            event_id: self.ids.next_id(),
            previous_item_id,
            item,
        })
        .await
    }

    /// Appends raw audio to the input buffer. Base64 encoding happens here;
    /// callers hand over plain bytes.
    pub async fn send_audio_chunk(&self, audio: &[u8]) -> SessionResult<String> {
        self.send_command(ClientCommand::audio_append(&self.ids, audio))
            .await
    }

    /// Commits buffered input audio as a user item.
    pub async fn commit_audio_buffer(&self) -> SessionResult<String> {
        self.send_command(ClientCommand::InputAudioBufferCommit {
            event_id: self.ids.next_id(),
        })
        .await
    }

    /// Discards buffered input audio.
    pub async fn clear_audio_buffer(&self) -> SessionResult<String> {
        self.send_command(ClientCommand::InputAudioBufferClear {
            event_id: self.ids.next_id(),
        })
        .await
    }

    /// Truncates a previously created item's audio, e.g. after a barge-in.
    pub async fn truncate_item(
        &self,
        item_id: impl Into<String>,
        content_index: u32,
        audio_end_ms: u32,
    ) -> SessionResult<String> {
        self.send_command(ClientCommand::ConversationItemTruncate {
            event_id: self.ids.next_id(),
            item_id: item_id.into(),
            content_index,
            audio_end_ms,
        })
        .await
    }

    /// Removes an item from the conversation history.
    pub async fn delete_item(&self, item_id: impl Into<String>) -> SessionResult<String> {
        self.send_command(ClientCommand::ConversationItemDelete {
            event_id: self.ids.next_id(),
            item_id: item_id.into(),
        })
        .await
    }

    /// Asks the server to generate a response.
    pub async fn create_response(
        &self,
        response: Option<ResponseConfig>,
    ) -> SessionResult<String> {
        self.send_command(ClientCommand::ResponseCreate {
            event_id: self.ids.next_id(),
            response,
        })
        .await
    }

    /// Cancels the in-progress response.
    pub async fn cancel_response(&self) -> SessionResult<String> {
        self.send_command(ClientCommand::ResponseCancel {
            event_id: self.ids.next_id(),
        })
        .await
    }

    async fn send_command(&self, command: ClientCommand) -> SessionResult<String> {
        let Some(writer) = &self.writer else {
            return Err(SessionError::NotConnected);
        };
        let event_id = command.event_id().to_string();
        let frame = command.encode()?;
        writer
            .send(WriterRequest::Frame(frame))
            .await
            .map_err(|_| SessionError::NotConnected)?;
        Ok(event_id)
    }
}

/// Drives one connection: serializes outbound frames and fans inbound
/// frames through the demultiplexer until either side finishes.
async fn run_loop(
    mut conn: Box<dyn Connection>,
    mut writer_rx: mpsc::Receiver<WriterRequest>,
    mut demux: Demultiplexer,
    state: Arc<RwLock<ConnectionState>>,
    connected: Arc<AtomicBool>,
) {
    loop {
        tokio::select! {
            request = writer_rx.recv() => match request {
                Some(WriterRequest::Frame(frame)) => {
                    if let Err(e) = conn.send(frame).await {
                        warn!(error = %e, "outbound send failed");
                        demux.transport_failed(e).await;
                        *state.write().await = ConnectionState::Failed;
                        break;
                    }
                }
                Some(WriterRequest::Shutdown) | None => {
                    let _ = conn.close().await;
                    demux.closed().await;
                    *state.write().await = ConnectionState::Closed;
                    break;
                }
            },
            inbound = conn.receive() => match inbound {
                Some(Ok(frame)) => {
                    if !demux.handle_frame(frame).await {
                        // Consumer dropped the stream; nothing left to do.
                        let _ = conn.close().await;
                        *state.write().await = ConnectionState::Closed;
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "connection failed");
                    demux.transport_failed(e).await;
                    *state.write().await = ConnectionState::Failed;
                    break;
                }
                None => {
                    debug!("peer closed connection");
                    demux.closed().await;
                    *state.write().await = ConnectionState::Closed;
                    break;
                }
            },
        }
    }
    connected.store(false, Ordering::SeqCst);
}
