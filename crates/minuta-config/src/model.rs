// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant specializing in meeting note summarization.";

/// Top-level Minuta configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MinutaConfig {
    /// Assistant identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Hosted completion, embedding and speech API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Conversation database settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Memory retrieval and write settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Managed vector index settings.
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Text-to-speech settings.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Reply sent when the completion service fails after all retries.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl AgentConfig {
    /// Resolves the system prompt: file first, then inline text, then the
    /// built-in default. An unreadable or empty file falls through.
    pub fn resolve_system_prompt(&self) -> String {
        if let Some(path) = &self.system_prompt_file {
            match std::fs::read_to_string(path) {
                Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                Ok(_) => tracing::warn!(path = %path, "system prompt file is empty"),
                Err(e) => tracing::warn!(path = %path, error = %e, "cannot read system prompt file"),
            }
        }
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }
}

fn default_agent_name() -> String {
    "minuta".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fallback_reply() -> String {
    "Sorry, I couldn't generate a reply right now. Please try again.".to_string()
}

/// Wire dialect of the hosted model API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// `{base_url}/chat/completions` with bearer auth.
    #[default]
    OpenAi,
    /// `{base_url}/openai/deployments/{model}/...?api-version=` with `api-key` auth.
    Azure,
}

/// Hosted model API configuration (completion, embeddings, speech).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` disables every hosted adapter.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub flavor: ApiFlavor,

    /// API root, e.g. `https://api.openai.com/v1` or an Azure resource endpoint.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Required for the Azure flavor.
    #[serde(default)]
    pub api_version: Option<String>,

    /// Chat model (or Azure deployment) name.
    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_openai_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per completion, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_min_backoff_secs")]
    pub min_backoff_secs: u64,

    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Remote embedding model (or Azure deployment) name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            flavor: ApiFlavor::default(),
            base_url: default_openai_base_url(),
            api_version: None,
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_openai_timeout_secs(),
            max_attempts: default_max_attempts(),
            min_backoff_secs: default_min_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            embedding_model: default_embedding_model(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    800
}

fn default_openai_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_min_backoff_secs() -> u64 {
    1
}

fn default_max_backoff_secs() -> u64 {
    30
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    data_root().join("minuta.db").to_string_lossy().into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Per-user data directory, `./minuta-data` when the platform has none.
pub fn data_root() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("minuta"))
        .unwrap_or_else(|| PathBuf::from("minuta-data"))
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory that receives synthesized audio files.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            audio_dir: default_audio_dir(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_audio_dir() -> String {
    data_root().join("audio").to_string_lossy().into_owned()
}

/// Which memory backends a deployment reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// SQLite-backed index in the application database.
    #[default]
    Local,
    /// Pinecone index only.
    Managed,
    /// Managed first, local as fallback; writes go to both.
    Both,
}

/// Embedding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    /// On-device ONNX model.
    #[default]
    Local,
    /// Hosted embedding API, falling back to local on failure.
    Remote,
}

/// Memory system configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, no memory operations occur.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub backend: MemoryBackend,

    #[serde(default)]
    pub embed_mode: EmbedMode,

    /// Candidates fetched per lookup.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum score for a stored exchange to be used as context (0.0-1.0).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Score from which the stored answer is reused verbatim (0.0-1.0).
    #[serde(default = "default_exact_match_threshold")]
    pub exact_match_threshold: f32,

    /// Local embedding model directory name.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Cross-encoder used when a backend returns no embeddings.
    #[serde(default = "default_rerank_enabled")]
    pub rerank_enabled: bool,

    #[serde(default = "default_reranker_model")]
    pub reranker_model: String,

    /// Where model files are cached. Defaults to the data directory.
    #[serde(default)]
    pub models_dir: Option<String>,

    /// Budget for a single embed or index call.
    #[serde(default = "default_memory_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            backend: MemoryBackend::default(),
            embed_mode: EmbedMode::default(),
            top_k: default_top_k(),
            similarity_threshold: default_similarity_threshold(),
            exact_match_threshold: default_exact_match_threshold(),
            model_name: default_model_name(),
            rerank_enabled: default_rerank_enabled(),
            reranker_model: default_reranker_model(),
            models_dir: None,
            timeout_ms: default_memory_timeout_ms(),
        }
    }
}

impl MemoryConfig {
    pub fn models_path(&self) -> PathBuf {
        self.models_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_root().join("models"))
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    3
}

fn default_similarity_threshold() -> f32 {
    0.7
}

fn default_exact_match_threshold() -> f32 {
    0.9
}

fn default_model_name() -> String {
    "multi-qa-MiniLM-L6-cos-v1".to_string()
}

fn default_rerank_enabled() -> bool {
    true
}

fn default_reranker_model() -> String {
    "ms-marco-MiniLM-L-6-v2".to_string()
}

fn default_memory_timeout_ms() -> u64 {
    10_000
}

/// Managed (Pinecone) index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PineconeConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Data-plane host of the index, e.g. `https://notes-abc123.svc.pinecone.io`.
    #[serde(default)]
    pub index_host: Option<String>,

    #[serde(default)]
    pub namespace: String,

    /// Ask the index to return stored vectors with query matches.
    #[serde(default)]
    pub include_values: bool,

    #[serde(default = "default_pinecone_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_host: None,
            namespace: String::new(),
            include_values: false,
            timeout_secs: default_pinecone_timeout_secs(),
        }
    }
}

fn default_pinecone_timeout_secs() -> u64 {
    10
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// When false, `tts` requests are answered without audio.
    #[serde(default = "default_speech_enabled")]
    pub enabled: bool,

    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    /// Audio container requested from the API and used as file extension.
    #[serde(default = "default_speech_format")]
    pub format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: default_speech_enabled(),
            model: default_speech_model(),
            voice: default_voice(),
            format: default_speech_format(),
        }
    }
}

fn default_speech_enabled() -> bool {
    true
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_speech_format() -> String {
    "wav".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_defaults_match_retrieval_policy() {
        let memory = MemoryConfig::default();
        assert_eq!(memory.top_k, 3);
        assert!((memory.similarity_threshold - 0.7).abs() < f32::EPSILON);
        assert!((memory.exact_match_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(memory.backend, MemoryBackend::Local);
        assert_eq!(memory.embed_mode, EmbedMode::Local);
    }

    #[test]
    fn completion_defaults() {
        let openai = OpenAiConfig::default();
        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(openai.max_tokens, 800);
        assert_eq!(openai.timeout_secs, 30);
        assert_eq!(openai.max_attempts, 3);
        assert_eq!((openai.min_backoff_secs, openai.max_backoff_secs), (1, 30));
    }

    #[test]
    fn system_prompt_prefers_file_then_inline_then_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompt.md");
        std::fs::write(&file, "  Summarize meetings tersely.\n").unwrap();

        let mut agent = AgentConfig {
            system_prompt: Some("inline".into()),
            system_prompt_file: Some(file.display().to_string()),
            ..AgentConfig::default()
        };
        assert_eq!(agent.resolve_system_prompt(), "Summarize meetings tersely.");

        agent.system_prompt_file = Some(dir.path().join("missing.md").display().to_string());
        assert_eq!(agent.resolve_system_prompt(), "inline");

        agent.system_prompt = None;
        assert_eq!(agent.resolve_system_prompt(), DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn backend_and_mode_parse_lowercase() {
        let memory: MemoryConfig =
            toml::from_str("backend = \"both\"\nembed_mode = \"remote\"").unwrap();
        assert_eq!(memory.backend, MemoryBackend::Both);
        assert_eq!(memory.embed_mode, EmbedMode::Remote);
    }
}
