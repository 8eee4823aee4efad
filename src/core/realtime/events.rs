//! Inbound realtime events.
//!
//! Mirrors the server's tagged JSON vocabulary. Variants carry only the
//! fields the session core and its consumers act on; any event not listed
//! here is still surfaced, untyped, by the demultiplexer.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::Deserialize;
use serde_json::Value;

/// A recognized server-to-client event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// The server reported an error. Non-fatal unless the connection drops.
    #[serde(rename = "error")]
    Error { error: ApiError },

    #[serde(rename = "session.created")]
    SessionCreated {
        #[serde(default)]
        event_id: Option<String>,
        session: Value,
    },

    #[serde(rename = "session.updated")]
    SessionUpdated {
        #[serde(default)]
        event_id: Option<String>,
        session: Value,
    },

    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: Option<u64>,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: Option<u64>,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted {
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.cleared")]
    InputAudioBufferCleared,

    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated {
        #[serde(default)]
        item: Option<Value>,
    },

    #[serde(rename = "conversation.item.truncated")]
    ConversationItemTruncated {
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        audio_end_ms: Option<u64>,
    },

    #[serde(rename = "conversation.item.deleted")]
    ConversationItemDeleted {
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "response.created")]
    ResponseCreated {
        #[serde(default)]
        response: Option<Value>,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        #[serde(default)]
        response: Option<Value>,
    },

    /// A base64 slice of output audio.
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        delta: String,
        #[serde(default)]
        item_id: Option<String>,
        #[serde(default)]
        output_index: Option<u32>,
        #[serde(default)]
        content_index: Option<u32>,
    },

    #[serde(rename = "response.audio.done")]
    AudioDone {
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta {
        delta: String,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        #[serde(default)]
        transcript: Option<String>,
        #[serde(default)]
        item_id: Option<String>,
    },
}

impl ServerEvent {
    /// Decodes the audio payload of an `AudioDelta`, or `None` for any
    /// other variant or a payload that is not valid base64.
    pub fn decode_audio(&self) -> Option<Vec<u8>> {
        match self {
            ServerEvent::AudioDelta { delta, .. } => BASE64_STANDARD.decode(delta).ok(),
            _ => None,
        }
    }
}

/// Error detail attached to an `error` event.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
    #[serde(default)]
    pub param: Option<String>,
    /// The client event id the error refers to, when applicable
    #[serde(default)]
    pub event_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_correlates_to_client_event_id() {
        let json = r#"{
            "type": "error",
            "error": {
                "type": "invalid_request_error",
                "code": "item_not_found",
                "message": "no such item",
                "event_id": "evt_12"
            }
        }"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        match event {
            ServerEvent::Error { error } => {
                assert_eq!(error.message, "no such item");
                assert_eq!(error.event_id.as_deref(), Some("evt_12"));
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn test_audio_delta_decodes_base64() {
        let json = r#"{"type":"response.audio.delta","delta":"AAEC","item_id":"item_3"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.decode_audio(), Some(vec![0u8, 1u8, 2u8]));
    }

    #[test]
    fn test_non_audio_event_has_no_audio() {
        let json = r#"{"type":"input_audio_buffer.cleared"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert!(event.decode_audio().is_none());
    }

    #[test]
    fn test_unknown_type_fails_typed_parse() {
        let json = r#"{"type":"rate_limits.updated","rate_limits":[]}"#;
        assert!(serde_json::from_str::<ServerEvent>(json).is_err());
    }

    #[test]
    fn test_speech_started_tolerates_missing_fields() {
        let json = r#"{"type":"input_audio_buffer.speech_started"}"#;
        let event: ServerEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(
            event,
            ServerEvent::SpeechStarted {
                audio_start_ms: None,
                item_id: None
            }
        ));
    }
}
