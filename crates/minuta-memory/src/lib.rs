// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory-augmented retrieval for Minuta.
//!
//! Decides, for each incoming question, whether a previously stored answer
//! can be reused and with what confidence, and writes completed exchanges
//! back so later questions can find them.
//!
//! ## Architecture
//!
//! - **OnnxEmbedder**: local 384-dim sentence embeddings
//! - **Embedder**: local/remote strategy with fallback to local
//! - **scorer**: cosine similarity and score selection
//! - **OnnxReranker**: cross-encoder for backends without stored vectors
//! - **LocalIndex**: SQLite vector index in the application database
//! - **MemoryRetriever**: candidate scoring and threshold tiers
//! - **MemoryWriter**: formatted write-back to one or more backends
//! - **ModelManager**: first-run model download

pub mod embedder;
pub mod model_manager;
mod onnx;
pub mod record;
pub mod reranker;
pub mod retriever;
pub mod scorer;
pub mod store;
pub mod strategy;
pub mod types;
pub mod writer;

pub use embedder::{OnnxEmbedder, EMBEDDING_DIM};
pub use model_manager::{ModelManager, ModelSpec, EMBEDDING_MODEL, RERANKER_MODEL};
pub use record::{Exchange, RecordFormat};
pub use reranker::OnnxReranker;
pub use retriever::{MemoryRetriever, RetrievalSettings};
pub use scorer::cosine_similarity;
pub use store::LocalIndex;
pub use strategy::{EmbedMode, Embedder};
pub use types::{MatchTier, MemoryMatch};
pub use writer::{MemoryWriter, WriteTarget};
