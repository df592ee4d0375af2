// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote embedding adapter.

use async_trait::async_trait;
use minuta_config::model::OpenAiConfig;
use minuta_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MinutaError,
    PluginAdapter,
};
use tracing::info;

use crate::client::OpenAiClient;
use crate::types::{EmbeddingRequest, EmbeddingResponse};

/// Output dimension of known embedding models; 1536 otherwise.
pub fn model_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// OpenAI embeddings implementing [`EmbeddingAdapter`].
pub struct OpenAiEmbedder {
    client: OpenAiClient,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &OpenAiConfig) -> Result<Self, MinutaError> {
        let client = OpenAiClient::new(config)?;
        info!(model = config.embedding_model, "OpenAI embedder initialized");
        Ok(Self::with_client(client, &config.embedding_model))
    }

    pub fn with_client(client: OpenAiClient, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            dimensions: model_dimensions(model),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embedding"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        let expected = input.texts.len();
        let url = self.client.url(&self.model, "embeddings");
        let body = EmbeddingRequest {
            model: self.model.clone(),
            input: input.texts,
        };

        let mut response: EmbeddingResponse = self
            .client
            .post_json(&url, &body)
            .await
            .map_err(|e| MinutaError::Embedding(e.to_string()))?
            .json()
            .await
            .map_err(|e| MinutaError::Embedding(format!("failed to parse embedding response: {e}")))?;

        if response.data.len() != expected {
            return Err(MinutaError::Embedding(format!(
                "expected {expected} embeddings, got {}",
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);

        Ok(EmbeddingOutput {
            embeddings: response.data.into_iter().map(|d| d.embedding).collect(),
            dimensions: self.dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer) -> OpenAiEmbedder {
        let config = OpenAiConfig {
            api_key: Some("test-key".into()),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(&config)
            .unwrap()
            .with_base_url(&server.uri())
            .with_retry(RetryPolicy::immediate(1));
        OpenAiEmbedder::with_client(client, "text-embedding-3-small")
    }

    #[tokio::test]
    async fn results_are_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["first", "second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .mount(&server)
            .await;

        let output = embedder(&server)
            .embed(EmbeddingInput {
                texts: vec!["first".into(), "second".into()],
            })
            .await
            .unwrap();
        assert_eq!(output.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(output.dimensions, 1536);
    }

    #[tokio::test]
    async fn short_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .mount(&server)
            .await;

        let err = embedder(&server)
            .embed(EmbeddingInput {
                texts: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MinutaError::Embedding(_)));
    }

    #[test]
    fn known_model_dimensions() {
        assert_eq!(model_dimensions("text-embedding-3-small"), 1536);
        assert_eq!(model_dimensions("text-embedding-3-large"), 3072);
        assert_eq!(model_dimensions("text-embedding-ada-002"), 1536);
    }
}
