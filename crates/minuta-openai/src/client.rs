// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client shared by the OpenAI adapters.
//!
//! Provides [`OpenAiClient`], which builds flavor-specific URLs and auth
//! headers and retries transient failures with randomized exponential
//! backoff.

use std::time::Duration;

use minuta_config::model::{ApiFlavor, OpenAiConfig};
use minuta_core::MinutaError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::{debug, warn};

use crate::retry::RetryPolicy;
use crate::types::ApiErrorResponse;

/// HTTP client for OpenAI or Azure OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    flavor: ApiFlavor,
    base_url: String,
    api_version: Option<String>,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Creates a client from the `[openai]` section.
    ///
    /// # API Key Resolution
    /// 1. `openai.api_key` if set and non-empty
    /// 2. `OPENAI_API_KEY` environment variable
    /// 3. Returns a configuration error
    pub fn new(config: &OpenAiConfig) -> Result<Self, MinutaError> {
        let api_key = resolve_api_key(&config.api_key)?;
        if config.flavor == ApiFlavor::Azure && config.api_version.is_none() {
            return Err(MinutaError::Config(
                "openai.api_version is required for the azure flavor".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        let (name, value) = match config.flavor {
            ApiFlavor::OpenAi => ("authorization", format!("Bearer {api_key}")),
            ApiFlavor::Azure => ("api-key", api_key),
        };
        headers.insert(
            name,
            HeaderValue::from_str(&value)
                .map_err(|e| MinutaError::Config(format!("invalid API key header value: {e}")))?,
        );
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MinutaError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            flavor: config.flavor,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            retry: RetryPolicy::from(config),
        })
    }

    /// Overrides the API root (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    /// Endpoint for `operation` (e.g. `chat/completions`); `deployment` is
    /// only used by Azure.
    pub fn url(&self, deployment: &str, operation: &str) -> String {
        match self.flavor {
            ApiFlavor::OpenAi => format!("{}/{operation}", self.base_url),
            ApiFlavor::Azure => format!(
                "{}/openai/deployments/{deployment}/{operation}?api-version={}",
                self.base_url,
                self.api_version.as_deref().unwrap_or_default()
            ),
        }
    }

    /// POSTs `body` as JSON and returns the first successful response.
    ///
    /// Retries on 408, 429, 500, 502, 503, 504, timeouts and connection
    /// errors until the policy's attempts run out. Other failures return
    /// immediately.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::Response, MinutaError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let error = match self.http.post(url).json(body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(status = %response.status(), attempt, "OpenAI response received");
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let error = api_error(status, &body);
                    if !is_transient_status(status) {
                        return Err(error);
                    }
                    error
                }
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    let error = MinutaError::Provider {
                        message: format!("HTTP request failed: {e}"),
                        source: Some(Box::new(e)),
                    };
                    if !transient {
                        return Err(error);
                    }
                    error
                }
            };

            if attempt < attempts {
                let delay = self.retry.backoff(attempt);
                warn!(attempt, ?delay, error = %error, "transient OpenAI error, will retry");
                tokio::time::sleep(delay).await;
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| MinutaError::provider("request failed after retries")))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
}

fn api_error(status: reqwest::StatusCode, body: &str) -> MinutaError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "OpenAI API error ({}): {}",
            api_err.error.type_.as_deref().unwrap_or(status.as_str()),
            api_err.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    };
    MinutaError::provider(message)
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, MinutaError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        MinutaError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(flavor: ApiFlavor) -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some("test-key".into()),
            flavor,
            api_version: Some("2024-06-01".into()),
            ..OpenAiConfig::default()
        }
    }

    fn test_client(server: &MockServer, flavor: ApiFlavor) -> OpenAiClient {
        OpenAiClient::new(&config(flavor))
            .unwrap()
            .with_base_url(&server.uri())
            .with_retry(RetryPolicy::immediate(3))
    }

    #[test]
    fn urls_follow_flavor() {
        let openai = OpenAiClient::new(&config(ApiFlavor::OpenAi)).unwrap();
        assert_eq!(
            openai.url("ignored", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );

        let azure = OpenAiClient::new(&config(ApiFlavor::Azure))
            .unwrap()
            .with_base_url("https://notes.openai.azure.com/");
        assert_eq!(
            azure.url("gpt-4o-mini", "embeddings"),
            "https://notes.openai.azure.com/openai/deployments/gpt-4o-mini/embeddings?api-version=2024-06-01"
        );
    }

    #[test]
    fn azure_without_api_version_is_rejected() {
        let config = OpenAiConfig {
            api_version: None,
            ..config(ApiFlavor::Azure)
        };
        let err = OpenAiClient::new(&config).unwrap_err().to_string();
        assert!(err.contains("api_version"), "got: {err}");
    }

    #[tokio::test]
    async fn openai_flavor_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ping"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, ApiFlavor::OpenAi);
        let url = client.url("", "ping");
        assert!(client.post_json(&url, &serde_json::json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn azure_flavor_sends_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/notes/ping"))
            .and(query_param("api-version", "2024-06-01"))
            .and(header("api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, ApiFlavor::Azure);
        let url = client.url("notes", "ping");
        assert!(client.post_json(&url, &serde_json::json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn retries_on_429_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server, ApiFlavor::OpenAi);
        let url = client.url("", "ping");
        assert!(client.post_json(&url, &serde_json::json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn fails_immediately_on_400() {
        let server = MockServer::start().await;
        let error_body = serde_json::json!({
            "error": {"type": "invalid_request_error", "message": "Bad model"}
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(&error_body))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server, ApiFlavor::OpenAi);
        let url = client.url("", "ping");
        let err = client
            .post_json(&url, &serde_json::json!({}))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn exhausts_attempts_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server, ApiFlavor::OpenAi);
        let url = client.url("", "ping");
        let err = client
            .post_json(&url, &serde_json::json!({}))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("503"), "got: {err}");
    }

    #[test]
    fn transient_statuses() {
        for code in [408u16, 429, 500, 502, 503, 504] {
            assert!(is_transient_status(reqwest::StatusCode::from_u16(code).unwrap()));
        }
        for code in [400u16, 401, 404, 422] {
            assert!(!is_transient_status(reqwest::StatusCode::from_u16(code).unwrap()));
        }
    }
}
