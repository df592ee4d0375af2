// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local persistent memory index backed by the application's SQLite database.
//!
//! Embeddings are stored as little-endian f32 BLOBs. Queries rank a session's
//! records by cosine similarity in process, which suits per-session record
//! counts, and always return the stored vectors.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;

use minuta_core::{
    AdapterType, Candidate, CandidateSet, HealthStatus, MinutaError, PluginAdapter,
    VectorIndexAdapter,
};
use minuta_storage::map_tr_err;

use crate::scorer::cosine_similarity;

/// Serialize an f32 vector for a BLOB column.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Inverse of [`vec_to_blob`]; trailing bytes that do not form a float are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// SQLite-backed [`VectorIndexAdapter`] with a dimension fixed at construction.
pub struct LocalIndex {
    conn: Connection,
    dimension: usize,
}

impl LocalIndex {
    /// Wraps a connection whose schema includes the `memory_records` table.
    pub fn new(conn: Connection, dimension: usize) -> Self {
        Self { conn, dimension }
    }

    fn check_dimension(&self, actual: usize) -> Result<(), MinutaError> {
        if actual == self.dimension {
            Ok(())
        } else {
            Err(MinutaError::DimensionMismatch {
                expected: self.dimension,
                actual,
            })
        }
    }

    /// Number of records stored for `session_id`.
    pub async fn count(&self, session_id: &str) -> Result<usize, MinutaError> {
        let session_id = session_id.to_string();
        self.conn
            .call(move |conn| {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM memory_records WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )?;
                Ok(n as usize)
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for LocalIndex {
    fn name(&self) -> &str {
        "local-index"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::VectorIndex
    }

    async fn health_check(&self) -> Result<HealthStatus, MinutaError> {
        let probe = self
            .conn
            .call(|conn| {
                let found: Option<i64> = conn
                    .query_row(
                        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'memory_records'",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(found.is_some())
            })
            .await
            .map_err(map_tr_err);

        Ok(match probe {
            Ok(true) => HealthStatus::Healthy,
            Ok(false) => HealthStatus::Unhealthy("memory_records table missing".into()),
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), MinutaError> {
        Ok(())
    }
}

#[async_trait]
impl VectorIndexAdapter for LocalIndex {
    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }

    /// Ids are `<session>_<n>` with `n` the rowid the record is stored under,
    /// so no live record shares a suffix with a new one.
    async fn insert(
        &self,
        session_id: &str,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<String, MinutaError> {
        self.check_dimension(embedding.len())?;

        let session_id = session_id.to_string();
        let text = text.to_string();
        let blob = vec_to_blob(&embedding);
        let dimension = self.dimension as i64;
        let created_at = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();

        self.conn
            .call(move |conn| {
                let next: i64 = conn.query_row(
                    "SELECT COALESCE(MAX(rowid), 0) + 1 FROM memory_records",
                    [],
                    |row| row.get(0),
                )?;
                let id = format!("{session_id}_{next}");
                conn.execute(
                    "INSERT INTO memory_records
                        (rowid, id, session_id, content, embedding, dimension, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![next, id, session_id, text, blob, dimension, created_at],
                )?;
                Ok(id)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn query(
        &self,
        session_id: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<CandidateSet, MinutaError> {
        self.check_dimension(embedding.len())?;
        if top_k == 0 {
            return Ok(CandidateSet {
                candidates: Vec::new(),
                embeddings_included: true,
            });
        }

        let session_id = session_id.to_string();
        let rows: Vec<(String, Vec<u8>)> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT content, embedding FROM memory_records
                     WHERE session_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )?;
                let rows = stmt.query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(map_tr_err)?;

        let mut scored: Vec<(f32, Candidate)> = rows
            .into_iter()
            .map(|(text, blob)| {
                let stored = blob_to_vec(&blob);
                let score = cosine_similarity(embedding, &stored);
                (
                    score,
                    Candidate {
                        text,
                        embedding: Some(stored),
                    },
                )
            })
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(CandidateSet {
            candidates: scored.into_iter().map(|(_, c)| c).collect(),
            embeddings_included: true,
        })
    }

    async fn delete_session(&self, session_id: &str) -> Result<Option<u64>, MinutaError> {
        let session_id = session_id.to_string();
        self.conn
            .call(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM memory_records WHERE session_id = ?1",
                    params![session_id],
                )?;
                Ok(Some(removed as u64))
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minuta_storage::Database;

    async fn index(dimension: usize) -> (LocalIndex, Database) {
        let db = Database::open_in_memory().await.unwrap();
        (LocalIndex::new(db.connection().clone(), dimension), db)
    }

    #[test]
    fn blob_round_trip_preserves_values() {
        let original = vec![0.1_f32, -0.5, 1.0, f32::MIN_POSITIVE];
        assert_eq!(blob_to_vec(&vec_to_blob(&original)), original);
        assert_eq!(vec_to_blob(&[0.0; 384]).len(), 384 * 4);
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_within_session() {
        let (index, _db) = index(2).await;
        index.insert("s1", "far", vec![0.0, 1.0]).await.unwrap();
        index.insert("s1", "near", vec![1.0, 0.1]).await.unwrap();
        index.insert("s2", "other session", vec![1.0, 0.0]).await.unwrap();

        let set = index.query("s1", &[1.0, 0.0], 5).await.unwrap();
        assert!(set.embeddings_included);
        let texts: Vec<_> = set.candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["near", "far"]);
        assert_eq!(set.candidates[0].embedding.as_deref(), Some(&[1.0, 0.1][..]));
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let (index, _db) = index(2).await;
        for i in 0..5 {
            index.insert("s1", &format!("r{i}"), vec![1.0, i as f32]).await.unwrap();
        }
        assert_eq!(index.query("s1", &[1.0, 0.0], 3).await.unwrap().candidates.len(), 3);
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let (index, _db) = index(2).await;
        let set = index.query("nobody", &[1.0, 0.0], 3).await.unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn ids_carry_increasing_suffix() {
        let (index, _db) = index(2).await;
        assert_eq!(index.insert("s1", "a", vec![1.0, 0.0]).await.unwrap(), "s1_1");
        assert_eq!(index.insert("s2", "b", vec![1.0, 0.0]).await.unwrap(), "s2_2");
        assert_eq!(index.insert("s1", "c", vec![1.0, 0.0]).await.unwrap(), "s1_3");
    }

    #[tokio::test]
    async fn insert_after_deleting_another_session_keeps_existing_records() {
        let (index, _db) = index(2).await;
        index.insert("s1", "a", vec![1.0, 0.0]).await.unwrap();
        index.insert("s2", "b", vec![1.0, 0.0]).await.unwrap();
        let c = index.insert("s2", "c", vec![1.0, 0.0]).await.unwrap();

        index.delete_session("s1").await.unwrap();
        let d = index.insert("s2", "d", vec![1.0, 0.0]).await.unwrap();

        assert_ne!(c, d);
        assert_eq!(index.count("s2").await.unwrap(), 3);
        let set = index.query("s2", &[1.0, 0.0], 10).await.unwrap();
        let texts: Vec<_> = set.candidates.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["b", "c", "d"]);
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let (index, _db) = index(384).await;
        let err = index.insert("s1", "a", vec![0.5; 1536]).await.unwrap_err();
        assert!(matches!(
            err,
            MinutaError::DimensionMismatch {
                expected: 384,
                actual: 1536
            }
        ));
        assert!(index.query("s1", &[0.5; 3], 3).await.is_err());
    }

    #[tokio::test]
    async fn delete_session_is_scoped() {
        let (index, _db) = index(2).await;
        index.insert("s1", "a", vec![1.0, 0.0]).await.unwrap();
        index.insert("s1", "b", vec![1.0, 0.0]).await.unwrap();
        index.insert("s2", "c", vec![1.0, 0.0]).await.unwrap();

        assert_eq!(index.delete_session("s1").await.unwrap(), Some(2));
        assert_eq!(index.count("s1").await.unwrap(), 0);
        assert_eq!(index.count("s2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reports_healthy_with_schema() {
        let (index, _db) = index(2).await;
        assert_eq!(index.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
