// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the adapters once at startup and wires them into a [`ChatService`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use minuta_config::model::MemoryConfig;
use minuta_config::{MemoryBackend, MinutaConfig};
use minuta_core::{EmbeddingAdapter, MinutaError, RerankAdapter, VectorIndexAdapter};
use minuta_gateway::{ChatService, ChatSettings};
use minuta_memory::{
    EmbedMode, Embedder, LocalIndex, MemoryRetriever, MemoryWriter, ModelManager, OnnxEmbedder,
    OnnxReranker, RecordFormat, RetrievalSettings, WriteTarget, EMBEDDING_MODEL, RERANKER_MODEL,
};
use minuta_openai::{OpenAiEmbedder, OpenAiProvider, OpenAiSpeech};
use minuta_storage::Database;
use tracing::{info, warn};

/// Opens the database and builds the chat service described by `config`.
///
/// The completion provider is required. Memory and speech degrade: when they
/// cannot be set up the service runs without them.
pub async fn build_chat_service(config: &MinutaConfig) -> Result<Arc<ChatService>, MinutaError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    info!(path = %config.storage.database_path, "database opened");

    let provider = Arc::new(OpenAiProvider::new(&config.openai)?);
    let mut chat = ChatService::new(provider, db.clone(), ChatSettings::from_config(config));

    if config.memory.enabled {
        match build_memory(config, &db).await {
            Ok((retriever, writer)) => chat = chat.with_memory(Arc::new(retriever), Arc::new(writer)),
            Err(e) => warn!(error = %e, "memory unavailable, continuing without it"),
        }
    }

    if config.speech.enabled {
        match OpenAiSpeech::new(&config.openai, &config.speech) {
            Ok(speech) => chat = chat.with_speech(Arc::new(speech)),
            Err(e) => warn!(error = %e, "speech unavailable, continuing without it"),
        }
    }

    info!(
        memory = chat.memory_enabled(),
        speech = chat.speech_enabled(),
        "chat service ready"
    );
    Ok(Arc::new(chat))
}

async fn build_memory(
    config: &MinutaConfig,
    db: &Database,
) -> Result<(MemoryRetriever, MemoryWriter), MinutaError> {
    let memory = &config.memory;
    let mut indexes: Vec<Arc<dyn VectorIndexAdapter>> = Vec::new();
    let mut targets = Vec::new();

    // Managed index first: a bad connection config fails before any download.
    if matches!(memory.backend, MemoryBackend::Managed | MemoryBackend::Both) {
        let managed = managed_index(config)?;
        indexes.push(managed.clone());
        targets.push(WriteTarget::new(managed, RecordFormat::Plain));
    }

    let models = ModelManager::new(memory.models_path());
    info!("ensuring embedding model is available...");
    let embedder = Arc::new(build_embedder(config, &models).await?);
    let dimension = embedder.dimensions(memory.embed_mode);

    if matches!(memory.backend, MemoryBackend::Local | MemoryBackend::Both) {
        let local: Arc<dyn VectorIndexAdapter> =
            Arc::new(LocalIndex::new(db.connection().clone(), dimension));
        indexes.push(local.clone());
        targets.push(WriteTarget::new(local, RecordFormat::SessionPrefixed));
    }

    let mut retriever = MemoryRetriever::new(
        embedder.clone(),
        indexes,
        RetrievalSettings::from(memory),
    );
    if memory.rerank_enabled && memory.backend != MemoryBackend::Local {
        match load_reranker(memory, &models).await {
            Ok(reranker) => retriever = retriever.with_reranker(reranker),
            Err(e) => warn!(error = %e, "reranker unavailable, text-only matches will be ignored"),
        }
    }

    let writer = MemoryWriter::new(embedder, targets, memory.embed_mode);
    info!(backend = ?memory.backend, embed_mode = ?memory.embed_mode, dimension, "memory system initialized");
    Ok((retriever, writer))
}

async fn build_embedder(config: &MinutaConfig, models: &ModelManager) -> Result<Embedder, MinutaError> {
    let memory = &config.memory;
    if memory.model_name != EMBEDDING_MODEL.name {
        warn!(
            configured = %memory.model_name,
            bundled = EMBEDDING_MODEL.name,
            "only the bundled local embedding model is supported"
        );
    }

    let dir = models.ensure(&EMBEDDING_MODEL).await?;
    let local: Arc<dyn EmbeddingAdapter> = Arc::new(load_blocking(&dir, OnnxEmbedder::new).await?);
    let mut embedder = Embedder::new(local).with_timeout(Duration::from_millis(memory.timeout_ms));

    if memory.embed_mode == EmbedMode::Remote {
        match OpenAiEmbedder::new(&config.openai) {
            Ok(remote) => embedder = embedder.with_remote(Arc::new(remote)),
            Err(e) => warn!(error = %e, "remote embeddings unavailable, using local model"),
        }
    }
    Ok(embedder)
}

async fn load_reranker(
    memory: &MemoryConfig,
    models: &ModelManager,
) -> Result<Arc<dyn RerankAdapter>, MinutaError> {
    if memory.reranker_model != RERANKER_MODEL.name {
        warn!(
            configured = %memory.reranker_model,
            bundled = RERANKER_MODEL.name,
            "only the bundled reranker is supported"
        );
    }
    let dir = models.ensure(&RERANKER_MODEL).await?;
    Ok(Arc::new(load_blocking(&dir, OnnxReranker::new).await?))
}

/// Runs an ONNX model load off the async worker threads.
async fn load_blocking<T, F>(dir: &Path, load: F) -> Result<T, MinutaError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, MinutaError> + Send + 'static,
{
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || load(&dir))
        .await
        .map_err(|e| MinutaError::Internal(format!("model load task failed: {e}")))?
}

#[cfg(feature = "pinecone")]
fn managed_index(config: &MinutaConfig) -> Result<Arc<dyn VectorIndexAdapter>, MinutaError> {
    Ok(Arc::new(minuta_pinecone::PineconeIndex::new(&config.pinecone)?))
}

#[cfg(not(feature = "pinecone"))]
fn managed_index(_config: &MinutaConfig) -> Result<Arc<dyn VectorIndexAdapter>, MinutaError> {
    Err(MinutaError::Config(
        "managed memory backend requires the `pinecone` feature".into(),
    ))
}
