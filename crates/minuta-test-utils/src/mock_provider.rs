// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider for deterministic testing.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use minuta_core::{
    AdapterType, MinutaError, ProviderAdapter, ProviderRequest, ProviderResponse, TokenUsage,
};

use crate::mock_adapter;

/// A mock LLM provider that returns pre-configured responses.
///
/// Responses are consumed in FIFO order. When the queue is empty, returns
/// "mock response". Every request is recorded for later inspection.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    failing: bool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with the given responses queued.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// A provider whose every call fails as if retries were exhausted.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn add_response(&self, response: String) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_response(&self) -> String {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

mock_adapter!(MockProvider, "mock-provider", AdapterType::Provider);

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, MinutaError> {
        self.requests.lock().unwrap().push(request);
        if self.failing {
            return Err(MinutaError::provider("mock provider configured to fail"));
        }

        let content = self.next_response();
        Ok(ProviderResponse {
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: content.split_whitespace().count() as u32,
            }),
            content,
            model: "mock-model".to_string(),
        })
    }
}
