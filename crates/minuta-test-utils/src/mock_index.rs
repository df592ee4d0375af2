// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vector index.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use minuta_core::{AdapterType, Candidate, CandidateSet, MinutaError, VectorIndexAdapter};

use crate::mock_adapter;

/// A stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub session_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// Session-partitioned index held in a `Vec`.
///
/// By default it behaves like the managed backend: ranked by dot product,
/// text only. [`InMemoryIndex::with_embeddings`] makes it return stored
/// vectors like the local backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    records: Arc<Mutex<Vec<Record>>>,
    include_embeddings: bool,
    failing: bool,
    delay: Option<Duration>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embeddings() -> Self {
        Self {
            include_embeddings: true,
            ..Self::default()
        }
    }

    /// Every call fails with an index error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Queries sleep for `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Stores a raw record without going through an embedder.
    pub fn seed(&self, session_id: &str, text: &str, embedding: Vec<f32>) {
        let mut records = self.records.lock().unwrap();
        let id = format!("{session_id}-{}", records.len());
        records.push(Record {
            id,
            session_id: session_id.to_string(),
            text: text.to_string(),
            embedding,
        });
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn texts(&self, session_id: &str) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.text.clone())
            .collect()
    }

    fn check(&self) -> Result<(), MinutaError> {
        if self.failing {
            Err(MinutaError::index("mock index configured to fail"))
        } else {
            Ok(())
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

mock_adapter!(InMemoryIndex, "memory-index", AdapterType::VectorIndex);

#[async_trait]
impl VectorIndexAdapter for InMemoryIndex {
    fn dimension(&self) -> Option<usize> {
        None
    }

    async fn insert(
        &self,
        session_id: &str,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<String, MinutaError> {
        self.check()?;
        self.seed(session_id, text, embedding);
        Ok(self
            .records
            .lock()
            .unwrap()
            .last()
            .map(|r| r.id.clone())
            .unwrap_or_default())
    }

    async fn query(
        &self,
        session_id: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<CandidateSet, MinutaError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check()?;

        let mut scored: Vec<(f32, Record)> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| (dot(embedding, &r.embedding), r.clone()))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(CandidateSet {
            candidates: scored
                .into_iter()
                .map(|(_, r)| Candidate {
                    text: r.text,
                    embedding: self.include_embeddings.then_some(r.embedding),
                })
                .collect(),
            embeddings_included: self.include_embeddings,
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<Option<u64>, MinutaError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.session_id != session_id);
        Ok(Some((before - records.len()) as u64))
    }
}
