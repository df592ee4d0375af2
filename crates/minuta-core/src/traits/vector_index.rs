// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Nearest-neighbour text index shared by the local and managed memory backends.

use async_trait::async_trait;

use crate::error::MinutaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::CandidateSet;

/// A session-partitioned vector index of memory records.
///
/// Records are append-only. Identifier collisions resolve as last write wins.
#[async_trait]
pub trait VectorIndexAdapter: PluginAdapter {
    /// Dimension fixed for this index, if the backend knows it.
    fn dimension(&self) -> Option<usize>;

    /// Stores one record and returns its identifier.
    async fn insert(
        &self,
        session_id: &str,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<String, MinutaError>;

    /// Returns up to `top_k` records of `session_id`, nearest first.
    ///
    /// A session with no records yields an empty set, not an error.
    async fn query(
        &self,
        session_id: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<CandidateSet, MinutaError>;

    /// Deletes every record of `session_id` and returns how many were removed,
    /// when the backend reports it.
    async fn delete_session(&self, session_id: &str) -> Result<Option<u64>, MinutaError>;
}
