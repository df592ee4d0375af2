// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat completion adapter.

use async_trait::async_trait;
use minuta_config::model::OpenAiConfig;
use minuta_core::{
    AdapterType, HealthStatus, MinutaError, PluginAdapter, ProviderAdapter, ProviderRequest,
    ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ApiMessage, ChatCompletionRequest, ChatCompletionResponse};

/// OpenAI chat completions implementing [`ProviderAdapter`].
pub struct OpenAiProvider {
    client: OpenAiClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self, MinutaError> {
        let client = OpenAiClient::new(config)?;
        info!(model = config.model, flavor = ?config.flavor, "OpenAI provider initialized");
        Ok(Self::with_client(client, config))
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn to_api_request(&self, request: &ProviderRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        // Avoids spending tokens; the client was built with valid credentials.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MinutaError> {
        let url = self.client.url(&self.model, "chat/completions");
        let body = self.to_api_request(&request);
        let response: ChatCompletionResponse = self
            .client
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| MinutaError::Provider {
                message: format!("failed to parse completion response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| MinutaError::provider("completion response contained no message"))?;

        Ok(ProviderResponse {
            content: content.trim().to_string(),
            model: if response.model.is_empty() {
                self.model.clone()
            } else {
                response.model
            },
            usage: response.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use minuta_core::ChatMessage;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiConfig {
            api_key: Some("test-key".into()),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(&config)
            .unwrap()
            .with_base_url(&server.uri())
            .with_retry(RetryPolicy::immediate(3));
        OpenAiProvider::with_client(client, &config)
    }

    fn request() -> ProviderRequest {
        ProviderRequest::new(vec![
            ChatMessage::system("You summarize meetings."),
            ChatMessage::user("Who owns QA?"),
        ])
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "temperature": 0.3,
                "max_tokens": 800,
                "messages": [
                    {"role": "system", "content": "You summarize meetings."},
                    {"role": "user", "content": "Who owns QA?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini-2024-07-18",
                "choices": [{"message": {"role": "assistant", "content": " Dana owns QA. "}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}
            })))
            .mount(&server)
            .await;

        let response = provider(&server).complete(request()).await.unwrap();
        assert_eq!(response.content, "Dana owns QA.");
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 4
            })
        );
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        assert!(provider(&server).complete(request()).await.is_err());
    }

    #[tokio::test]
    async fn exhausted_retries_surface_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = provider(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, MinutaError::Provider { .. }));
    }

    #[test]
    fn request_overrides_take_precedence() {
        let config = OpenAiConfig {
            api_key: Some("k".into()),
            ..OpenAiConfig::default()
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        let mut req = request();
        req.temperature = Some(0.0);
        req.max_tokens = Some(50);
        let api = provider.to_api_request(&req);
        assert_eq!(api.temperature, 0.0);
        assert_eq!(api.max_tokens, 50);
        assert_eq!(api.messages[0].role, "system");
    }
}
