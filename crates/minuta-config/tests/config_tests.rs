// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use std::path::Path;

use minuta_config::diagnostic::ConfigError;
use minuta_config::model::ApiFlavor;
use minuta_config::{
    load_and_validate_str, load_config_from_path, load_config_from_str, EmbedMode, MemoryBackend,
};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[agent]
name = "notes"
log_level = "debug"
system_prompt = "Summarize."

[openai]
api_key = "sk-test"
flavor = "azure"
base_url = "https://example.openai.azure.com"
api_version = "2024-06-01"
model = "gpt-4o-mini"
temperature = 0.2

[storage]
database_path = "/tmp/minuta.db"
wal_mode = false

[server]
host = "0.0.0.0"
port = 9000
audio_dir = "/tmp/audio"

[memory]
backend = "both"
embed_mode = "remote"
top_k = 5
similarity_threshold = 0.6
exact_match_threshold = 0.95

[pinecone]
api_key = "pc-test"
index_host = "https://notes.svc.pinecone.io"
include_values = true

[speech]
voice = "nova"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.agent.name, "notes");
    assert_eq!(config.openai.flavor, ApiFlavor::Azure);
    assert_eq!(config.openai.api_version.as_deref(), Some("2024-06-01"));
    assert!(!config.storage.wal_mode);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.memory.backend, MemoryBackend::Both);
    assert_eq!(config.memory.embed_mode, EmbedMode::Remote);
    assert_eq!(config.memory.top_k, 5);
    assert!(config.pinecone.include_values);
    assert_eq!(config.speech.voice, "nova");
    assert_eq!(config.speech.format, "wav");
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.memory.top_k, 3);
    assert!(config.memory.enabled);
    assert!(config.openai.api_key.is_none());
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[memory]\nsimilarity_treshold = 0.5\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key");
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "similarity_treshold");
            assert_eq!(suggestion.as_deref(), Some("similarity_threshold"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[server]\nport = \"eighty\"\n";
    let errors = load_and_validate_str(toml).expect_err("bad type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port")))
    );
}

#[test]
fn unknown_section_is_rejected() {
    let toml = "[chroma]\npath = \"x\"\n";
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn validation_errors_surface_through_load() {
    let toml = "[memory]\nbackend = \"managed\"\n";
    let errors = load_and_validate_str(toml).expect_err("missing index host");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("index_host")))
    );
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "minuta.toml",
            "[memory]\ntop_k = 4\n\n[openai]\nmodel = \"from-file\"\n",
        )?;
        jail.set_env("MINUTA_OPENAI_API_KEY", "sk-env");
        jail.set_env("MINUTA_MEMORY_SIMILARITY_THRESHOLD", "0.65");

        let config = load_config_from_path(Path::new("minuta.toml")).expect("loads");
        assert_eq!(config.memory.top_k, 4);
        assert_eq!(config.openai.model, "from-file");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        assert!((config.memory.similarity_threshold - 0.65).abs() < 1e-6);
        Ok(())
    });
}
