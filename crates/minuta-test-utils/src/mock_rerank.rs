// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-encoder stand-in.

use std::collections::HashSet;

use async_trait::async_trait;
use minuta_core::{AdapterType, MinutaError, RerankAdapter};

use crate::mock_adapter;

#[derive(Debug, Clone)]
enum Mode {
    Overlap,
    Fixed(Vec<f32>),
    Failing,
}

/// Reranker scoring by word overlap, by a fixed score list, or not at all.
#[derive(Debug, Clone)]
pub struct MockReranker {
    mode: Mode,
}

impl Default for MockReranker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReranker {
    /// Scores each candidate by the share of query words it contains.
    pub fn new() -> Self {
        Self {
            mode: Mode::Overlap,
        }
    }

    /// Returns `scores[i]` for candidate `i`, and 0.0 past the end.
    pub fn fixed(scores: Vec<f32>) -> Self {
        Self {
            mode: Mode::Fixed(scores),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: Mode::Failing,
        }
    }
}

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

mock_adapter!(MockReranker, "mock-reranker", AdapterType::Rerank);

#[async_trait]
impl RerankAdapter for MockReranker {
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, MinutaError> {
        match &self.mode {
            Mode::Failing => Err(MinutaError::Embedding("mock reranker configured to fail".into())),
            Mode::Fixed(scores) => Ok((0..candidates.len())
                .map(|i| scores.get(i).copied().unwrap_or(0.0))
                .collect()),
            Mode::Overlap => {
                let query_words = words(query);
                if query_words.is_empty() {
                    return Ok(vec![0.0; candidates.len()]);
                }
                Ok(candidates
                    .iter()
                    .map(|c| {
                        let shared = query_words.intersection(&words(c)).count();
                        shared as f32 / query_words.len() as f32
                    })
                    .collect())
            }
        }
    }
}
