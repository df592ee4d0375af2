// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI and Azure OpenAI adapters for Minuta.
//!
//! One [`OpenAiClient`] carries flavor-specific URLs, authentication and
//! retry; the completion, embedding and speech adapters are thin request
//! mappers on top of it.

pub mod client;
pub mod embedding;
pub mod provider;
pub mod retry;
pub mod speech;
pub mod types;

pub use client::OpenAiClient;
pub use embedding::OpenAiEmbedder;
pub use provider::OpenAiProvider;
pub use retry::RetryPolicy;
pub use speech::OpenAiSpeech;
