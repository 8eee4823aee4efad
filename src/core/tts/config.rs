//! TTS client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TTS_WS_AUTH_URL;
use crate::error::SessionError;

/// Audio container/encoding requested from the synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
    Ogg,
    Mulaw,
    Raw,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
            OutputFormat::Ogg => "ogg",
            OutputFormat::Mulaw => "mulaw",
            OutputFormat::Raw => "raw",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mpeg",
            OutputFormat::Wav => "audio/wav",
            OutputFormat::Flac => "audio/flac",
            OutputFormat::Ogg => "audio/ogg",
            OutputFormat::Mulaw => "audio/basic",
            OutputFormat::Raw => "application/octet-stream",
        }
    }
}

/// Configuration for one [`super::TtsClient`].
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// API key sent as a bearer token on both the auth exchange and the
    /// socket handshake
    pub api_key: String,
    /// Account identifier sent as X-User-Id
    pub user_id: String,
    /// Default voice for synthesis commands
    pub voice: String,
    /// Default output encoding
    pub output_format: OutputFormat,
    /// Synthesis quality hint
    pub quality: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Playback speed multiplier
    pub speed: Option<f32>,
    /// Output sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Auth endpoint, overridable for test servers
    pub auth_url: String,
    /// Default deadline for one synthesis round trip
    pub request_timeout: Duration,
}

impl TtsConfig {
    pub fn new(
        api_key: impl Into<String>,
        user_id: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
            voice: voice.into(),
            output_format: OutputFormat::default(),
            quality: None,
            temperature: None,
            speed: None,
            sample_rate: None,
            auth_url: TTS_WS_AUTH_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
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

    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.api_key.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "api_key must not be empty".to_string(),
            ));
        }
        if self.user_id.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "user_id must not be empty".to_string(),
            ));
        }
        if self.voice.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "voice must not be empty".to_string(),
            ));
        }
        if let Some(speed) = self.speed {
            if !(0.1..=5.0).contains(&speed) {
                return Err(SessionError::InvalidConfiguration(format!(
                    "speed {speed} outside supported range 0.1..=5.0"
                )));
            }
        }
        Ok(())
    }
}
