// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-to-speech adapter.

use async_trait::async_trait;
use minuta_config::model::{OpenAiConfig, SpeechConfig};
use minuta_core::{
    AdapterType, HealthStatus, MinutaError, PluginAdapter, SpeechAdapter, SpeechOutput,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::SpeechRequest;

/// OpenAI `audio/speech` implementing [`SpeechAdapter`].
pub struct OpenAiSpeech {
    client: OpenAiClient,
    model: String,
    voice: String,
    format: String,
}

impl OpenAiSpeech {
    pub fn new(openai: &OpenAiConfig, speech: &SpeechConfig) -> Result<Self, MinutaError> {
        let client = OpenAiClient::new(openai)?;
        info!(model = speech.model, voice = speech.voice, "OpenAI speech initialized");
        Ok(Self::with_client(client, speech))
    }

    pub fn with_client(client: OpenAiClient, speech: &SpeechConfig) -> Self {
        Self {
            client,
            model: speech.model.clone(),
            voice: speech.voice.clone(),
            format: speech.format.clone(),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiSpeech {
    fn name(&self) -> &str {
        "openai-speech"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        Ok(())
    }
}

#[async_trait]
impl SpeechAdapter for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<SpeechOutput, MinutaError> {
        if text.trim().is_empty() {
            return Err(MinutaError::Speech("nothing to synthesize".into()));
        }

        let url = self.client.url(&self.model, "audio/speech");
        let body = SpeechRequest {
            model: self.model.clone(),
            input: text.to_string(),
            voice: self.voice.clone(),
            response_format: self.format.clone(),
        };
        let audio = self
            .client
            .post_json(&url, &body)
            .await
            .map_err(|e| MinutaError::Speech(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| MinutaError::Speech(format!("failed to read audio: {e}")))?;

        debug!(bytes = audio.len(), format = %self.format, "speech synthesized");
        Ok(SpeechOutput {
            audio: audio.to_vec(),
            format: self.format.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn speech(server: &MockServer) -> OpenAiSpeech {
        let config = OpenAiConfig {
            api_key: Some("test-key".into()),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(&config)
            .unwrap()
            .with_base_url(&server.uri())
            .with_retry(RetryPolicy::immediate(1));
        OpenAiSpeech::with_client(client, &SpeechConfig::default())
    }

    #[tokio::test]
    async fn returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/speech"))
            .and(body_partial_json(serde_json::json!({
                "model": "tts-1",
                "voice": "alloy",
                "response_format": "wav",
                "input": "Meeting moved to Thursday."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFF....WAVE".to_vec()))
            .mount(&server)
            .await;

        let output = speech(&server).synthesize("Meeting moved to Thursday.").await.unwrap();
        assert_eq!(output.audio, b"RIFF....WAVE");
        assert_eq!(output.format, "wav");
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_a_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(speech(&server).synthesize("  ").await.is_err());
    }
}
