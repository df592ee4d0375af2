// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapters that need no model files.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use minuta_core::{AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, MinutaError};
use sha2::{Digest, Sha256};

use crate::mock_adapter;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "be", "did", "do", "does", "for", "how", "i", "in", "is",
    "it", "me", "of", "on", "or", "our", "please", "s", "tell", "that", "the", "this", "to",
    "was", "we", "were", "what", "when", "where", "which", "who", "with", "you",
];

/// Deterministic bag-of-keywords embedder.
///
/// Lowercases, splits on anything that is not alphanumeric, drops stopwords
/// and hashes each remaining token into one of `dim` buckets. Texts with the
/// same keyword set get identical unit vectors, so paraphrases such as
/// "What is the capital of France?" and "What's France's capital?" score 1.0.
#[derive(Debug, Clone)]
pub struct KeywordEmbedder {
    dim: usize,
}

impl KeywordEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty() && !STOPWORDS.contains(t));
        for token in tokens {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % self.dim as u64) as usize
    }
}

mock_adapter!(KeywordEmbedder, "keyword-embedder", AdapterType::Embedding);

#[async_trait]
impl EmbeddingAdapter for KeywordEmbedder {
    fn dimensions(&self) -> usize {
        self.dim
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector(t)).collect(),
            dimensions: self.dim,
        })
    }
}

/// Embedder with a fixed text-to-vector table; unknown text is an error.
#[derive(Debug, Clone, Default)]
pub struct StaticEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dim: usize,
}

impl StaticEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dim,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

mock_adapter!(StaticEmbedder, "static-embedder", AdapterType::Embedding);

#[async_trait]
impl EmbeddingAdapter for StaticEmbedder {
    fn dimensions(&self) -> usize {
        self.dim
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        let embeddings = input
            .texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .ok_or_else(|| MinutaError::Embedding(format!("no vector for {t:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dim,
        })
    }
}

/// Embedder that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingEmbedder;

mock_adapter!(FailingEmbedder, "failing-embedder", AdapterType::Embedding);

#[async_trait]
impl EmbeddingAdapter for FailingEmbedder {
    fn dimensions(&self) -> usize {
        0
    }

    async fn embed(&self, _input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        Err(MinutaError::Embedding("mock embedder configured to fail".into()))
    }
}

/// Keyword embedder that sleeps before answering.
#[derive(Debug, Clone)]
pub struct SlowEmbedder {
    delay: Duration,
    inner: KeywordEmbedder,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: KeywordEmbedder::new(32),
        }
    }
}

mock_adapter!(SlowEmbedder, "slow-embedder", AdapterType::Embedding);

#[async_trait]
impl EmbeddingAdapter for SlowEmbedder {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MinutaError> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn paraphrase_with_same_keywords_is_identical() {
        let e = KeywordEmbedder::new(384);
        let a = e.vector("What is the capital of France?");
        let b = e.vector("What's France's capital?");
        assert_eq!(a, b);
        assert!((dot(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unrelated_texts_are_not_identical() {
        let e = KeywordEmbedder::new(384);
        let a = e.vector("quarterly budget review");
        let b = e.vector("holiday rota for december");
        assert!(dot(&a, &b) < 0.5);
    }

    #[test]
    fn stopwords_only_gives_zero_vector() {
        let e = KeywordEmbedder::new(8);
        assert!(e.vector("what is the").iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn static_embedder_rejects_unknown_text() {
        let e = StaticEmbedder::new(2).with("known", vec![1.0, 0.0]);
        let ok = e
            .embed(EmbeddingInput {
                texts: vec!["known".into()],
            })
            .await
            .unwrap();
        assert_eq!(ok.embeddings, vec![vec![1.0, 0.0]]);
        assert!(e
            .embed(EmbeddingInput {
                texts: vec!["unknown".into()],
            })
            .await
            .is_err());
    }
}
