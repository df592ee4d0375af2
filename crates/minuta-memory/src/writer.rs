// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-back of completed exchanges into the memory backends.

use std::sync::Arc;

use minuta_core::VectorIndexAdapter;
use tracing::{debug, error, warn};

use crate::record::RecordFormat;
use crate::strategy::{EmbedMode, Embedder};

/// One backend plus the text layout it stores.
#[derive(Clone)]
pub struct WriteTarget {
    pub index: Arc<dyn VectorIndexAdapter>,
    pub format: RecordFormat,
}

impl WriteTarget {
    pub fn new(index: Arc<dyn VectorIndexAdapter>, format: RecordFormat) -> Self {
        Self { index, format }
    }
}

/// Persists user/assistant exchanges to every configured backend.
///
/// Failures are logged and swallowed; a write never affects the reply.
pub struct MemoryWriter {
    embedder: Arc<Embedder>,
    targets: Vec<WriteTarget>,
    mode: EmbedMode,
}

impl MemoryWriter {
    pub fn new(embedder: Arc<Embedder>, targets: Vec<WriteTarget>, mode: EmbedMode) -> Self {
        Self {
            embedder,
            targets,
            mode,
        }
    }

    /// Stores the exchange and returns how many backends accepted it.
    pub async fn commit(&self, session_id: &str, user_message: &str, assistant_reply: &str) -> usize {
        if user_message.trim().is_empty() || assistant_reply.trim().is_empty() {
            debug!(session_id, "skipping memory write for empty exchange");
            return 0;
        }

        let mut written = 0;
        for target in &self.targets {
            let text = target.format.render(session_id, user_message, assistant_reply);
            let Some(embedding) = self.embedder.embed(&text, self.mode).await else {
                warn!(
                    index = target.index.name(),
                    session_id, "could not embed exchange, memory not stored"
                );
                continue;
            };

            match target.index.insert(session_id, &text, embedding).await {
                Ok(id) => {
                    debug!(index = target.index.name(), session_id, id = %id, "memory stored");
                    written += 1;
                }
                Err(e) => {
                    error!(index = target.index.name(), session_id, error = %e, "memory write failed");
                }
            }
        }

        metrics::counter!("minuta_memory_writes_total").increment(written as u64);
        written
    }

    /// Removes a session's records from every backend; failures are logged.
    pub async fn forget(&self, session_id: &str) {
        for target in &self.targets {
            match target.index.delete_session(session_id).await {
                Ok(removed) => debug!(index = target.index.name(), session_id, ?removed, "memory cleared"),
                Err(e) => error!(index = target.index.name(), session_id, error = %e, "memory delete failed"),
            }
        }
    }
}
