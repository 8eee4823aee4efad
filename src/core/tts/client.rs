//! Single-shot synthesis client.
//!
//! # Architecture
//!
//! Each synthesis is its own connection: auth exchange, socket open, one
//! command, audio chunks in, terminal marker, close. Nothing is shared
//! between syntheses, so the client itself is cheap to clone and use
//! concurrently.
//!
//! # Example
//!
//! ```no_run
//! use speechlink::{TtsClient, TtsConfig};
//! use speechlink::transport::WsTransport;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TtsConfig::new("api-key", "user-id", "nova");
//! let client = TtsClient::new(config, Arc::new(WsTransport::new()))?;
//! let audio = client.synthesize("Hello from the other side.").await?;
//! println!("{} bytes of audio", audio.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::MAX_TEXT_LENGTH;
use super::auth::fetch_websocket_url;
use super::config::TtsConfig;
use super::messages::{StreamMessage, SynthesisCommand};
use crate::core::demux::{Demultiplexer, EventStream, SessionEvent};
use crate::error::{SessionError, SessionResult};
use crate::transport::Transport;

/// Events produced per synthesis are few; a small channel suffices since
/// the connection loop drains it after every frame.
const SYNTH_CHANNEL_CAPACITY: usize = 32;

/// One-shot text-to-speech client.
#[derive(Clone)]
pub struct TtsClient {
    config: TtsConfig,
    http: reqwest::Client,
    transport: Arc<dyn Transport>,
}

impl TtsClient {
    pub fn new(config: TtsConfig, transport: Arc<dyn Transport>) -> SessionResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SessionError::InvalidConfiguration(e.to_string()))?;
        Ok(Self {
            config,
            http,
            transport,
        })
    }

    /// Synthesizes `text` with the configured voice and format, returning
    /// the complete audio.
    pub async fn synthesize(&self, text: &str) -> SessionResult<Bytes> {
        validate_text(text)?;
        let mut command = SynthesisCommand::new(text, self.config.voice.clone())
            .with_output_format(self.config.output_format.as_str());
        command.quality = self.config.quality.clone();
        command.temperature = self.config.temperature;
        command.speed = self.config.speed;
        command.sample_rate = self.config.sample_rate;
        self.synthesize_with(command, None).await
    }

    /// Synthesizes with a fully caller-built command. `timeout` overrides
    /// the configured deadline; the deadline covers auth, handshake, and
    /// the whole audio stream.
    pub async fn synthesize_with(
        &self,
        command: SynthesisCommand,
        timeout: Option<Duration>,
    ) -> SessionResult<Bytes> {
        let deadline = timeout.unwrap_or(self.config.request_timeout);
        let result = tokio::time::timeout(deadline, async {
            let ws_url = fetch_websocket_url(
                &self.http,
                &self.config.auth_url,
                &self.config.api_key,
                &self.config.user_id,
            )
            .await
            .map_err(|e| SessionError::Connect(e.into()))?;
            self.run_synthesis(&ws_url, command).await
        })
        .await;
        match result {
            Ok(inner) => inner,
            Err(_) => Err(SessionError::Timeout),
        }
    }

    /// Synthesizes against an already-vended socket URL, skipping the auth
    /// exchange.
    pub async fn synthesize_via(
        &self,
        ws_url: &Url,
        command: SynthesisCommand,
        timeout: Option<Duration>,
    ) -> SessionResult<Bytes> {
        let deadline = timeout.unwrap_or(self.config.request_timeout);
        match tokio::time::timeout(deadline, self.run_synthesis(ws_url, command)).await {
            Ok(inner) => inner,
            Err(_) => Err(SessionError::Timeout),
        }
    }

    async fn run_synthesis(
        &self,
        ws_url: &Url,
        mut command: SynthesisCommand,
    ) -> SessionResult<Bytes> {
        if command.request_id.is_none() {
            command.request_id = Some(Uuid::new_v4().to_string());
        }
        let request_id = command.request_id.clone();

        let headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.config.api_key),
            ),
            ("X-User-Id".to_string(), self.config.user_id.clone()),
        ];
        let mut conn = self
            .transport
            .open(ws_url, &headers)
            .await
            .map_err(SessionError::Transport)?;
        debug!(request_id = ?request_id, "synthesis connection open");

        conn.send(command.encode()?)
            .await
            .map_err(SessionError::Transport)?;

        let (event_tx, event_rx) = mpsc::channel(SYNTH_CHANNEL_CAPACITY);
        let mut demux = Demultiplexer::new(event_tx);
        let mut events = EventStream::new(event_rx);

        loop {
            let inbound = match conn.receive().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!(error = %e, "synthesis stream failed");
                    return Err(SessionError::Transport(e));
                }
                None => return Err(SessionError::StreamEnded),
            };
            demux.handle_frame(inbound).await;

            while let Some(event) = events.try_next() {
                match event {
                    SessionEvent::Artifact(artifact) => {
                        if artifact.request_id.is_some() && artifact.request_id != request_id {
                            warn!(
                                got = ?artifact.request_id,
                                expected = ?request_id,
                                "terminal marker for a different request"
                            );
                            continue;
                        }
                        let _ = conn.close().await;
                        info!(bytes = artifact.data.len(), "synthesis complete");
                        return Ok(artifact.data);
                    }
                    SessionEvent::Stream(StreamMessage::Error { message, code, .. }) => {
                        let _ = conn.close().await;
                        return Err(SessionError::Synthesis { message, code });
                    }
                    SessionEvent::Stream(_) | SessionEvent::Unclassified(_) => {}
                    SessionEvent::Protocol(e) => {
                        debug!(error = %e, "ignoring malformed frame in synthesis stream");
                    }
                    _ => {}
                }
            }
        }
    }
}

fn validate_text(text: &str) -> SessionResult<()> {
    if text.trim().is_empty() {
        return Err(SessionError::InvalidConfiguration(
            "synthesis text must not be empty".to_string(),
        ));
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_LENGTH {
        return Err(SessionError::InvalidConfiguration(format!(
            "synthesis text is {chars} characters, maximum is {MAX_TEXT_LENGTH}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_bounds() {
        assert!(validate_text("hello").is_ok());
        assert!(validate_text("   ").is_err());
        assert!(validate_text(&"x".repeat(MAX_TEXT_LENGTH)).is_ok());
        assert!(validate_text(&"x".repeat(MAX_TEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_text_counts_chars_not_bytes() {
        // Multibyte characters count once each.
        let text = "é".repeat(MAX_TEXT_LENGTH);
        assert!(validate_text(&text).is_ok());
    }
}
