// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory retrieval engine.
//!
//! For each incoming query the engine decides whether a stored exchange can
//! be reused verbatim, should be passed to the model as context, or is not
//! relevant at all:
//!
//! 1. Embed the query (no vector: no memory).
//! 2. Fetch the session's `top_k` nearest records from each backend in turn.
//! 3. Parse every record into question and answer, skipping malformed ones.
//! 4. Score by cosine against the embedded *stored question* when the backend
//!    returns embeddings, otherwise by cross-encoder over the raw record text.
//! 5. Keep the single best record (first seen on ties) and gate it by the
//!    exact-match and similarity thresholds.
//!
//! Backend errors and timeouts degrade to "no memory"; they never fail the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use minuta_config::model::MemoryConfig;
use minuta_core::{CandidateSet, RerankAdapter, VectorIndexAdapter};
use tracing::{debug, warn};

use crate::record::Exchange;
use crate::scorer::{best_candidate, cosine_similarity};
use crate::strategy::{EmbedMode, Embedder};
use crate::types::{MatchTier, MemoryMatch};

/// Tunables for one retriever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub similarity_threshold: f32,
    pub exact_match_threshold: f32,
    pub embed_mode: EmbedMode,
    /// Budget for each backend query.
    pub timeout: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

impl From<&MemoryConfig> for RetrievalSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
            exact_match_threshold: config.exact_match_threshold,
            embed_mode: config.embed_mode,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }
}

/// Searches one or more vector indexes for a reusable prior exchange.
pub struct MemoryRetriever {
    embedder: Arc<Embedder>,
    /// Searched in order; the first confident match wins.
    indexes: Vec<Arc<dyn VectorIndexAdapter>>,
    reranker: Option<Arc<dyn RerankAdapter>>,
    settings: RetrievalSettings,
}

impl MemoryRetriever {
    pub fn new(
        embedder: Arc<Embedder>,
        indexes: Vec<Arc<dyn VectorIndexAdapter>>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            embedder,
            indexes,
            reranker: None,
            settings,
        }
    }

    /// Cross-encoder for backends that return text without embeddings.
    pub fn with_reranker(mut self, reranker: Arc<dyn RerankAdapter>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Looks up `query` with the configured `top_k` and threshold.
    pub async fn search(&self, session_id: &str, query: &str) -> MemoryMatch {
        self.search_with(
            session_id,
            query,
            self.settings.top_k,
            self.settings.similarity_threshold,
        )
        .await
    }

    /// Looks up `query` with explicit `top_k` and similarity threshold.
    ///
    /// Backends are tried in order. The first non-`None` tier is returned;
    /// if none qualifies, the best below-threshold score is reported.
    pub async fn search_with(
        &self,
        session_id: &str,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> MemoryMatch {
        let result = self.search_indexes(session_id, query, top_k, threshold).await;
        metrics::counter!("minuta_memory_lookups_total", "tier" => result.tier.as_str())
            .increment(1);
        debug!(
            session_id,
            score = result.score,
            tier = result.tier.as_str(),
            "memory lookup"
        );
        result
    }

    async fn search_indexes(
        &self,
        session_id: &str,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> MemoryMatch {
        let Some(query_vector) = self.embedder.embed(query, self.settings.embed_mode).await else {
            return MemoryMatch::none();
        };

        let mut best = MemoryMatch::none();
        for index in &self.indexes {
            let Some(set) = self.fetch(index.as_ref(), session_id, &query_vector, top_k).await else {
                continue;
            };
            let found = self.score(query, &query_vector, &set, threshold).await;
            if found.is_hit() {
                return found;
            }
            if found.score > best.score {
                best = found;
            }
        }
        best
    }

    /// Candidates from one backend; `None` for errors, timeouts and empty sets.
    async fn fetch(
        &self,
        index: &dyn VectorIndexAdapter,
        session_id: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Option<CandidateSet> {
        let timeout = self.settings.timeout;
        match tokio::time::timeout(timeout, index.query(session_id, query_vector, top_k)).await {
            Ok(Ok(set)) if !set.is_empty() => Some(set),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!(index = index.name(), error = %e, "memory query failed");
                None
            }
            Err(_) => {
                warn!(index = index.name(), ?timeout, "memory query timed out");
                None
            }
        }
    }

    async fn score(
        &self,
        query: &str,
        query_vector: &[f32],
        set: &CandidateSet,
        threshold: f32,
    ) -> MemoryMatch {
        let parsed: Vec<(&str, Exchange)> = set
            .candidates
            .iter()
            .filter_map(|c| Exchange::parse(&c.text).map(|e| (c.text.as_str(), e)))
            .collect();
        if parsed.is_empty() {
            return MemoryMatch::none();
        }

        let winner = if set.embeddings_included {
            self.best_by_question(query_vector, &parsed).await
        } else {
            self.best_by_rerank(query, &parsed).await
        };
        let Some((index, score)) = winner else {
            return MemoryMatch::none();
        };

        let (text, exchange) = &parsed[index];
        self.classify(text, exchange, score, threshold)
    }

    async fn best_by_question(
        &self,
        query_vector: &[f32],
        parsed: &[(&str, Exchange)],
    ) -> Option<(usize, f32)> {
        let mut scores = Vec::with_capacity(parsed.len());
        for (_, exchange) in parsed {
            let score = match self
                .embedder
                .embed(&exchange.question, self.settings.embed_mode)
                .await
            {
                Some(question_vector) => cosine_similarity(query_vector, &question_vector),
                None => 0.0,
            };
            scores.push(score);
        }
        best_candidate(&scores)
    }

    async fn best_by_rerank(&self, query: &str, parsed: &[(&str, Exchange)]) -> Option<(usize, f32)> {
        let Some(reranker) = &self.reranker else {
            warn!("index returned no embeddings and no reranker is configured");
            return None;
        };
        let texts: Vec<String> = parsed.iter().map(|(text, _)| text.to_string()).collect();
        match reranker.rerank(query, &texts).await {
            Ok(scores) => best_candidate(&scores),
            Err(e) => {
                warn!(reranker = reranker.name(), error = %e, "rerank failed");
                None
            }
        }
    }

    fn classify(&self, text: &str, exchange: &Exchange, score: f32, threshold: f32) -> MemoryMatch {
        if score >= self.settings.exact_match_threshold {
            MemoryMatch {
                text: exchange.answer.clone(),
                score,
                tier: MatchTier::Exact,
            }
        } else if score >= threshold {
            MemoryMatch {
                text: text.to_string(),
                score,
                tier: MatchTier::Contextual,
            }
        } else {
            MemoryMatch::below_threshold(score)
        }
    }
}
