// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-encoder re-ranker (ms-marco-MiniLM-L-6-v2).
//!
//! Used when a vector index returns ranked text without stored embeddings:
//! the query and each candidate are encoded as one sequence pair and the
//! single relevance logit is squashed through a sigmoid.

use std::path::Path;

use async_trait::async_trait;

use minuta_core::{AdapterType, HealthStatus, MinutaError, PluginAdapter, RerankAdapter};

use crate::onnx::OnnxModel;
use crate::scorer::sigmoid;

pub struct OnnxReranker {
    model: OnnxModel,
}

impl OnnxReranker {
    /// Loads `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn new(model_dir: &Path) -> Result<Self, MinutaError> {
        Ok(Self {
            model: OnnxModel::load(model_dir)?,
        })
    }

    /// Relevance of `candidate` to `query` in `[0, 1]`.
    pub fn score_pair(&self, query: &str, candidate: &str) -> Result<f32, MinutaError> {
        let encoding = self.model.encode((query, candidate))?;
        // Output shape: [1, 1] logits
        let logit = self
            .model
            .infer(&encoding, |_, data| data.first().copied())?
            .ok_or_else(|| MinutaError::Embedding("cross-encoder returned no logits".into()))?;
        Ok(sigmoid(logit))
    }
}

#[async_trait]
impl PluginAdapter for OnnxReranker {
    fn name(&self) -> &str {
        "onnx-cross-encoder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Rerank
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        if self.model.is_available() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy("session lock poisoned".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        Ok(())
    }
}

#[async_trait]
impl RerankAdapter for OnnxReranker {
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, MinutaError> {
        candidates
            .iter()
            .map(|candidate| self.score_pair(query, candidate))
            .collect()
    }
}
