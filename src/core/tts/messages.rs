//! TTS wire messages.

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::transport::Frame;

/// Response body of the websocket-auth exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct WsAuthResponse {
    /// Short-lived, pre-authorized socket URL
    pub websocket_url: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// The single JSON command that starts a synthesis.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SynthesisCommand {
    pub text: String,
    pub voice: String,
    pub output_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Correlation id echoed by stream markers. Filled in with a random id
    /// when the caller does not supply one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl SynthesisCommand {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            output_format: "mp3".to_string(),
            quality: None,
            temperature: None,
            speed: None,
            sample_rate: None,
            request_id: None,
        }
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Serializes the command into a text frame.
    pub fn encode(&self) -> Result<Frame, EncodeError> {
        Ok(Frame::Text(serde_json::to_string(self)?))
    }
}

/// JSON markers interleaved with the binary audio stream.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Synthesis accepted, audio follows
    Start {
        request_id: String,
        #[serde(default)]
        status: Option<u16>,
    },
    /// All audio for the request has been sent
    End {
        request_id: String,
        #[serde(default)]
        status: Option<u16>,
    },
    /// Synthesis failed server-side
    Error {
        message: String,
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        request_id: Option<String>,
    },
}

impl StreamMessage {
    pub fn is_start(&self) -> bool {
        matches!(self, StreamMessage::Start { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StreamMessage::End { .. })
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            StreamMessage::Start { request_id, .. } | StreamMessage::End { request_id, .. } => {
                Some(request_id)
            }
            StreamMessage::Error { request_id, .. } => request_id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_auth_response_parses_minimal_body() {
        let body = r#"{"websocket_url":"wss://x"}"#;
        let parsed: WsAuthResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.websocket_url, "wss://x");
        assert!(parsed.expires_at.is_none());
    }

    #[test]
    fn test_command_omits_unset_fields() {
        let command = SynthesisCommand::new("hello", "nova").with_request_id("req-1");
        let Frame::Text(text) = command.encode().unwrap() else {
            panic!("expected text frame");
        };
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["text"], "hello");
        assert_eq!(json["voice"], "nova");
        assert_eq!(json["output_format"], "mp3");
        assert_eq!(json["request_id"], "req-1");
        assert!(json.get("quality").is_none());
        assert!(json.get("speed").is_none());
    }

    #[test]
    fn test_command_builder_overrides() {
        let command = SynthesisCommand::new("hi", "nova")
            .with_output_format("wav")
            .with_quality("premium")
            .with_speed(1.2)
            .with_sample_rate(24_000);
        assert_eq!(command.output_format, "wav");
        assert_eq!(command.quality.as_deref(), Some("premium"));
        assert_eq!(command.sample_rate, Some(24_000));
    }

    #[test]
    fn test_stream_markers_parse() {
        let start: StreamMessage =
            serde_json::from_str(r#"{"type":"start","request_id":"r1","status":200}"#).unwrap();
        assert!(start.is_start());
        assert_eq!(start.request_id(), Some("r1"));

        let end: StreamMessage =
            serde_json::from_str(r#"{"type":"end","request_id":"r1"}"#).unwrap();
        assert!(end.is_end());

        let error: StreamMessage =
            serde_json::from_str(r#"{"type":"error","message":"bad voice","code":"E02"}"#).unwrap();
        assert!(!error.is_end());
        assert_eq!(error.request_id(), None);
    }
}
