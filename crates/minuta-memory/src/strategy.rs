// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding strategy: local model by default, remote API on request with
//! local fallback.

use std::sync::Arc;
use std::time::Duration;

use minuta_core::{EmbeddingAdapter, EmbeddingInput, MinutaError};
use tracing::{error, warn};

pub use minuta_config::EmbedMode;

/// Embeds single texts for retrieval and write-back.
///
/// Failures never propagate: a failed remote call falls back to the local
/// model, and a failed local call yields `None`.
pub struct Embedder {
    local: Arc<dyn EmbeddingAdapter>,
    remote: Option<Arc<dyn EmbeddingAdapter>>,
    timeout: Duration,
}

impl Embedder {
    pub fn new(local: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            local,
            remote: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Enables [`EmbedMode::Remote`].
    pub fn with_remote(mut self, remote: Arc<dyn EmbeddingAdapter>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Budget for each underlying embed call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dimension of vectors produced in `mode` when nothing fails.
    pub fn dimensions(&self, mode: EmbedMode) -> usize {
        match (mode, &self.remote) {
            (EmbedMode::Remote, Some(remote)) => remote.dimensions(),
            _ => self.local.dimensions(),
        }
    }

    /// Vector for `text`, or `None` when the text is blank or no model could embed it.
    pub async fn embed(&self, text: &str, mode: EmbedMode) -> Option<Vec<f32>> {
        if text.trim().is_empty() {
            return None;
        }

        if mode == EmbedMode::Remote {
            match &self.remote {
                Some(remote) => match self.call(remote.as_ref(), text).await {
                    Ok(vector) => return Some(vector),
                    Err(e) => warn!(
                        adapter = remote.name(),
                        error = %e,
                        "remote embedding failed, falling back to local model"
                    ),
                },
                None => warn!("remote embedding requested but not configured, using local model"),
            }
        }

        match self.call(self.local.as_ref(), text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                error!(adapter = self.local.name(), error = %e, "local embedding failed");
                None
            }
        }
    }

    async fn call(&self, adapter: &dyn EmbeddingAdapter, text: &str) -> Result<Vec<f32>, MinutaError> {
        let input = EmbeddingInput {
            texts: vec![text.to_string()],
        };
        let output = tokio::time::timeout(self.timeout, adapter.embed(input))
            .await
            .map_err(|_| MinutaError::Timeout {
                duration: self.timeout,
            })??;

        match output.embeddings.into_iter().next() {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(MinutaError::Embedding("adapter returned no vector".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minuta_test_utils::{FailingEmbedder, KeywordEmbedder, SlowEmbedder};

    fn local() -> Arc<dyn EmbeddingAdapter> {
        Arc::new(KeywordEmbedder::new(64))
    }

    #[tokio::test]
    async fn blank_text_is_none() {
        let embedder = Embedder::new(local());
        assert!(embedder.embed("", EmbedMode::Local).await.is_none());
        assert!(embedder.embed("   \n\t", EmbedMode::Local).await.is_none());
    }

    #[tokio::test]
    async fn local_embedding_is_deterministic() {
        let embedder = Embedder::new(local());
        let a = embedder.embed("quarterly roadmap", EmbedMode::Local).await.unwrap();
        let b = embedder.embed("quarterly roadmap", EmbedMode::Local).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn remote_mode_uses_remote_adapter() {
        let embedder = Embedder::new(local()).with_remote(Arc::new(KeywordEmbedder::new(128)));
        let v = embedder.embed("budget", EmbedMode::Remote).await.unwrap();
        assert_eq!(v.len(), 128);
        assert_eq!(embedder.dimensions(EmbedMode::Remote), 128);
        assert_eq!(embedder.dimensions(EmbedMode::Local), 64);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn remote_failure_falls_back_to_local() {
        let embedder = Embedder::new(local()).with_remote(Arc::new(FailingEmbedder));
        let v = embedder.embed("budget", EmbedMode::Remote).await.unwrap();
        assert_eq!(v.len(), 64);
        assert!(logs_contain("falling back to local model"));
    }

    #[tokio::test]
    async fn remote_mode_without_remote_uses_local() {
        let embedder = Embedder::new(local());
        assert_eq!(embedder.embed("x", EmbedMode::Remote).await.unwrap().len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_remote_times_out_and_falls_back() {
        let embedder = Embedder::new(local())
            .with_remote(Arc::new(SlowEmbedder::new(Duration::from_secs(60))))
            .with_timeout(Duration::from_secs(1));
        let v = embedder.embed("budget", EmbedMode::Remote).await.unwrap();
        assert_eq!(v.len(), 64);
    }

    #[tokio::test]
    async fn local_failure_is_none() {
        let embedder = Embedder::new(Arc::new(FailingEmbedder));
        assert!(embedder.embed("anything", EmbedMode::Local).await.is_none());
    }
}
