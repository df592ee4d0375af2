// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ONNX embedding adapter for local inference with multi-qa-MiniLM-L6-cos-v1.
//!
//! Produces 384-dimensional, L2-normalized embeddings on CPU with no external
//! API calls. The model is tuned for question/answer retrieval, which is what
//! memory lookups compare.

use std::path::Path;

use async_trait::async_trait;

use minuta_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MinutaError,
    PluginAdapter,
};

use crate::onnx::OnnxModel;

/// Embedding dimensions of the local model.
pub const EMBEDDING_DIM: usize = 384;

/// Local sentence embedder.
pub struct OnnxEmbedder {
    model: OnnxModel,
}

impl OnnxEmbedder {
    /// Loads `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn new(model_dir: &Path) -> Result<Self, MinutaError> {
        Ok(Self {
            model: OnnxModel::load(model_dir)?,
        })
    }

    /// Embed a single text string, returning a 384-dim unit vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MinutaError> {
        let encoding = self.model.encode(text)?;
        let mask = encoding.get_attention_mask().to_vec();
        let seq_len = mask.len();

        // Output shape: [1, seq_len, hidden]
        let pooled = self.model.infer(&encoding, |shape, data| {
            let hidden = shape.last().copied().unwrap_or(0) as usize;
            mean_pool_with_attention(data, &mask, seq_len, hidden)
        })?;

        if pooled.len() != EMBEDDING_DIM {
            return Err(MinutaError::DimensionMismatch {
                expected: EMBEDDING_DIM,
                actual: pooled.len(),
            });
        }
        Ok(l2_normalize(&pooled))
    }
}

/// Attention-masked mean over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[u32],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0usize;

    for (token, row) in embeddings
        .chunks_exact(hidden_size.max(1))
        .take(seq_len)
        .enumerate()
    {
        if attention_mask.get(token).copied().unwrap_or(0) == 0 {
            continue;
        }
        for (acc, v) in sum.iter_mut().zip(row) {
            *acc += v;
        }
        count += 1;
    }

    if count > 0 {
        let n = count as f32;
        sum.iter_mut().for_each(|v| *v /= n);
    }
    sum
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
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
impl EmbeddingAdapter for OnnxEmbedder {
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_general_vector() {
        let n = l2_normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 0.001);
        assert!((n[1] - 0.8).abs() < 0.001);
    }

    #[test]
    fn l2_normalize_leaves_zero_vector() {
        assert_eq!(l2_normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn mean_pool_skips_padding() {
        let embeddings = [0.0, 0.0, 0.0, 1.0, 2.0, 3.0];
        let pooled = mean_pool_with_attention(&embeddings, &[0, 1], 2, 3);
        assert_eq!(pooled, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mean_pool_averages_real_tokens() {
        let embeddings = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let pooled = mean_pool_with_attention(&embeddings, &[1, 1, 1], 3, 2);
        assert!((pooled[0] - 3.0).abs() < f32::EPSILON);
        assert!((pooled[1] - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mean_pool_with_fully_masked_input_is_zero() {
        let pooled = mean_pool_with_attention(&[1.0, 1.0], &[0], 1, 2);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }
}
