//! Outbound realtime commands.
//!
//! Every command is a tagged JSON object with a client-assigned `event_id`.
//! Ids are generated once per session and are strictly monotonic, so the
//! server's acknowledgements can be correlated back to the command that
//! caused them.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::transport::Frame;

// =============================================================================
// Event id generation
// =============================================================================

/// Hands out strictly monotonic event ids for one session.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    counter: AtomicU64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id. Two sessions may reuse ids; within one session
    /// they never repeat.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("evt_{n}")
    }
}

// =============================================================================
// Commands
// =============================================================================

/// A client-to-server control command.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Replace mutable session parameters
    #[serde(rename = "session.update")]
    SessionUpdate {
        event_id: String,
        session: SessionConfig,
    },

    /// Insert an item into the conversation history
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        event_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_item_id: Option<String>,
        item: ConversationItem,
    },

    /// Append base64 audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { event_id: String, audio: String },

    /// Commit buffered input audio as a user item
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit { event_id: String },

    /// Discard buffered input audio
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear { event_id: String },

    /// Truncate a previously created item's audio
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        event_id: String,
        item_id: String,
        content_index: u32,
        audio_end_ms: u32,
    },

    /// Remove an item from the conversation history
    #[serde(rename = "conversation.item.delete")]
    ConversationItemDelete { event_id: String, item_id: String },

    /// Ask the server to generate a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        event_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<ResponseConfig>,
    },

    /// Cancel the in-progress response
    #[serde(rename = "response.cancel")]
    ResponseCancel { event_id: String },
}

impl ClientCommand {
    /// The client-assigned id carried by every command.
    pub fn event_id(&self) -> &str {
        match self {
            ClientCommand::SessionUpdate { event_id, .. }
            | ClientCommand::ConversationItemCreate { event_id, .. }
            | ClientCommand::InputAudioBufferAppend { event_id, .. }
            | ClientCommand::InputAudioBufferCommit { event_id }
            | ClientCommand::InputAudioBufferClear { event_id }
            | ClientCommand::ConversationItemTruncate { event_id, .. }
            | ClientCommand::ConversationItemDelete { event_id, .. }
            | ClientCommand::ResponseCreate { event_id, .. }
            | ClientCommand::ResponseCancel { event_id } => event_id,
        }
    }

    /// Serializes the command into a text frame.
    pub fn encode(&self) -> Result<Frame, EncodeError> {
        Ok(Frame::Text(serde_json::to_string(self)?))
    }

    /// Builds an audio append command, base64-encoding the raw bytes.
    pub fn audio_append(ids: &EventIdGenerator, audio: &[u8]) -> Self {
        ClientCommand::InputAudioBufferAppend {
            event_id: ids.next_id(),
            audio: BASE64_STANDARD.encode(audio),
        }
    }

    /// Builds a user text message item.
    pub fn user_text(ids: &EventIdGenerator, text: impl Into<String>) -> Self {
        ClientCommand::ConversationItemCreate {
            event_id: ids.next_id(),
            previous_item_id: None,
            item: ConversationItem {
                id: None,
                item_type: "message".to_string(),
                status: None,
                role: Some("user".to_string()),
                content: Some(vec![ContentPart {
                    content_type: "input_text".to_string(),
                    text: Some(text.into()),
                    audio: None,
                    transcript: None,
                }]),
            },
        }
    }
}

// =============================================================================
// Payload types
// =============================================================================

/// Mutable session parameters. Absent fields are left untouched by the
/// server, so everything is optional and omitted when unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SessionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One conversation history item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentPart>>,
}

/// One content part of an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// Per-response overrides for `response.create`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResponseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

// =============================================================================
// Tests
// =============================================================================
