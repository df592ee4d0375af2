// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cross-encoder re-ranking.

use async_trait::async_trait;

use crate::error::MinutaError;
use crate::traits::adapter::PluginAdapter;

/// Scores (query, candidate) pairs jointly.
#[async_trait]
pub trait RerankAdapter: PluginAdapter {
    /// Returns one relevance score in `[0, 1]` per candidate, in input order.
    async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, MinutaError>;
}
