//! Realtime session configuration.

use url::Url;

use super::commands::SessionConfig;
use super::{DEFAULT_REALTIME_MODEL, REALTIME_WS_URL};
use crate::error::{ConnectError, SessionError};

/// Configuration for one realtime session.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Model selected via query parameter
    pub model: String,
    /// Voice applied in the initial session update
    pub voice: Option<String>,
    /// System instructions applied in the initial session update
    pub instructions: Option<String>,
    /// Sampling temperature applied in the initial session update
    pub temperature: Option<f32>,
    /// Endpoint, overridable for test servers
    pub endpoint: String,
}

impl RealtimeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: None,
            instructions: None,
            temperature: None,
            endpoint: REALTIME_WS_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.api_key.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "api_key must not be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "model must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Endpoint plus the model query parameter.
    pub fn build_url(&self) -> Result<Url, ConnectError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ConnectError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        url.query_pairs_mut().append_pair("model", &self.model);
        Ok(url)
    }

    /// The session update sent immediately after connecting.
    pub fn initial_session(&self) -> SessionConfig {
        SessionConfig {
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            instructions: self.instructions.clone(),
            voice: self.voice.clone(),
            input_audio_format: Some("pcm16".to_string()),
            output_audio_format: Some("pcm16".to_string()),
            temperature: self.temperature,
        }
    }
}
