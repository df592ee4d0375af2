// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX models used by memory retrieval.
//!
//! Files are fetched from HuggingFace into `<models_dir>/<model>/` and reused
//! on later runs.

use std::path::{Path, PathBuf};

use minuta_core::MinutaError;
use tokio::sync::Mutex;
use tracing::info;

/// Where to fetch one model's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    /// Directory name under the models directory.
    pub name: &'static str,
    pub model_url: &'static str,
    pub tokenizer_url: &'static str,
}

/// Question/answer sentence embedder (384 dimensions).
pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "multi-qa-MiniLM-L6-cos-v1",
    model_url: "https://huggingface.co/sentence-transformers/multi-qa-MiniLM-L6-cos-v1/resolve/main/onnx/model.onnx",
    tokenizer_url: "https://huggingface.co/sentence-transformers/multi-qa-MiniLM-L6-cos-v1/resolve/main/tokenizer.json",
};

/// Passage re-ranking cross-encoder.
pub const RERANKER_MODEL: ModelSpec = ModelSpec {
    name: "ms-marco-MiniLM-L-6-v2",
    model_url: "https://huggingface.co/cross-encoder/ms-marco-MiniLM-L-6-v2/resolve/main/onnx/model.onnx",
    tokenizer_url: "https://huggingface.co/cross-encoder/ms-marco-MiniLM-L-6-v2/resolve/main/tokenizer.json",
};

/// Manages model download and path resolution.
pub struct ModelManager {
    models_dir: PathBuf,
    /// Serializes downloads so concurrent callers fetch each file once.
    download_lock: Mutex<()>,
}

impl ModelManager {
    pub fn new(models_dir: PathBuf) -> Self {
        Self {
            models_dir,
            download_lock: Mutex::new(()),
        }
    }

    pub fn model_dir(&self, spec: &ModelSpec) -> PathBuf {
        self.models_dir.join(spec.name)
    }

    /// True when both the model and its tokenizer are on disk.
    pub fn is_available(&self, spec: &ModelSpec) -> bool {
        let dir = self.model_dir(spec);
        dir.join("model.onnx").exists() && dir.join("tokenizer.json").exists()
    }

    /// Downloads any missing file of `spec` and returns its directory.
    pub async fn ensure(&self, spec: &ModelSpec) -> Result<PathBuf, MinutaError> {
        let dir = self.model_dir(spec);
        if self.is_available(spec) {
            return Ok(dir);
        }

        let _guard = self.download_lock.lock().await;
        if self.is_available(spec) {
            return Ok(dir);
        }

        info!(model = spec.name, "model not found, downloading from HuggingFace");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MinutaError::Internal(format!("failed to create model directory: {e}")))?;

        for (filename, url) in [
            ("model.onnx", spec.model_url),
            ("tokenizer.json", spec.tokenizer_url),
        ] {
            let dest = dir.join(filename);
            if dest.exists() {
                continue;
            }
            match download_file(url, &dest).await {
                Ok(size) => info!(model = spec.name, file = filename, bytes = size, "downloaded"),
                Err(e) => {
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        }

        info!(model = spec.name, path = %dir.display(), "model ready");
        Ok(dir)
    }
}

/// Writes to a temporary sibling first so an interrupted download never
/// leaves a truncated file under the final name.
async fn download_file(url: &str, dest: &Path) -> Result<usize, MinutaError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| MinutaError::Internal(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(MinutaError::Internal(format!(
            "download failed with status {}: {url}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MinutaError::Internal(format!("failed to read body from {url}: {e}")))?;

    let partial = dest.with_extension("part");
    tokio::fs::write(&partial, &bytes)
        .await
        .map_err(|e| MinutaError::Internal(format!("failed to write {}: {e}", partial.display())))?;
    tokio::fs::rename(&partial, dest)
        .await
        .map_err(|e| MinutaError::Internal(format!("failed to move {}: {e}", dest.display())))?;

    Ok(bytes.len())
}
