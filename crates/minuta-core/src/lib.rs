// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Minuta.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Completion, embedding,
//! re-ranking, vector index and speech adapters all implement traits defined
//! here, which lets the retrieval engine be assembled from explicit
//! dependency objects.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MinutaError;
pub use types::{
    AdapterType, Candidate, CandidateSet, ChatMessage, EmbeddingInput, EmbeddingOutput,
    HealthStatus, ProviderRequest, ProviderResponse, Role, SessionId, SpeechOutput, TokenUsage,
};

pub use traits::{
    EmbeddingAdapter, PluginAdapter, ProviderAdapter, RerankAdapter, SpeechAdapter,
    VectorIndexAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Provider,
            AdapterType::Embedding,
            AdapterType::Rerank,
            AdapterType::VectorIndex,
            AdapterType::Speech,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
    }

    #[test]
    fn chat_message_constructors_tag_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").content, "a");
    }

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = MinutaError::DimensionMismatch {
            expected: 384,
            actual: 1536,
        };
        assert_eq!(
            err.to_string(),
            "embedding dimension mismatch: expected 384, got 1536"
        );
    }

    #[test]
    fn empty_candidate_set_has_no_embeddings() {
        let set = CandidateSet::empty();
        assert!(set.is_empty());
        assert!(!set.embeddings_included);
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _provider(_: &dyn ProviderAdapter) {}
        fn _embedding(_: &dyn EmbeddingAdapter) {}
        fn _rerank(_: &dyn RerankAdapter) {}
        fn _index(_: &dyn VectorIndexAdapter) {}
        fn _speech(_: &dyn SpeechAdapter) {}
    }
}
