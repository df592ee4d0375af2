// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Minuta integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without model downloads or external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock LLM provider with pre-configured responses
//! - [`KeywordEmbedder`] - Bag-of-keywords embedder with stable output
//! - [`StaticEmbedder`], [`FailingEmbedder`], [`SlowEmbedder`] - Embedders for edge cases
//! - [`MockReranker`] - Word-overlap or fixed-score reranker
//! - [`InMemoryIndex`] - Vector index with or without stored embeddings
//! - [`MockSpeech`] - Speech adapter returning canned audio

pub mod mock_embedding;
pub mod mock_index;
pub mod mock_provider;
pub mod mock_rerank;
pub mod mock_speech;

pub use mock_embedding::{FailingEmbedder, KeywordEmbedder, SlowEmbedder, StaticEmbedder};
pub use mock_index::InMemoryIndex;
pub use mock_provider::MockProvider;
pub use mock_rerank::MockReranker;
pub use mock_speech::MockSpeech;

/// Implements [`minuta_core::PluginAdapter`] for a mock that is always healthy.
macro_rules! mock_adapter {
    ($ty:ty, $name:expr, $kind:expr) => {
        #[async_trait::async_trait]
        impl minuta_core::PluginAdapter for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }

            fn adapter_type(&self) -> minuta_core::AdapterType {
                $kind
            }

            async fn health_check(
                &self,
            ) -> Result<minuta_core::HealthStatus, minuta_core::MinutaError> {
                Ok(minuta_core::HealthStatus::Healthy)
            }

            async fn shutdown(&self) -> Result<(), minuta_core::MinutaError> {
                Ok(())
            }
        }
    };
}

pub(crate) use mock_adapter;
