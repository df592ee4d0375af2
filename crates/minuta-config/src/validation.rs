// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{ApiFlavor, MemoryBackend, MinutaConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &MinutaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let memory = &config.memory;
    for (name, value) in [
        ("memory.similarity_threshold", memory.similarity_threshold),
        ("memory.exact_match_threshold", memory.exact_match_threshold),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::validation(format!(
                "{name} must be between 0.0 and 1.0, got {value}"
            )));
        }
    }
    if memory.exact_match_threshold < memory.similarity_threshold {
        errors.push(ConfigError::validation(format!(
            "memory.exact_match_threshold ({}) must not be below memory.similarity_threshold ({})",
            memory.exact_match_threshold, memory.similarity_threshold
        )));
    }
    if memory.top_k == 0 {
        errors.push(ConfigError::validation("memory.top_k must be at least 1"));
    }

    let needs_pinecone = memory.enabled
        && matches!(memory.backend, MemoryBackend::Managed | MemoryBackend::Both);
    if needs_pinecone && config.pinecone.index_host.is_none() {
        errors.push(ConfigError::validation(
            "pinecone.index_host is required when memory.backend uses the managed index",
        ));
    }

    let openai = &config.openai;
    if openai.flavor == ApiFlavor::Azure && openai.api_version.is_none() {
        errors.push(ConfigError::validation(
            "openai.api_version is required when openai.flavor = \"azure\"",
        ));
    }
    if openai.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "openai.max_attempts must be at least 1",
        ));
    }
    if openai.min_backoff_secs > openai.max_backoff_secs {
        errors.push(ConfigError::validation(format!(
            "openai.min_backoff_secs ({}) exceeds openai.max_backoff_secs ({})",
            openai.min_backoff_secs, openai.max_backoff_secs
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(config: &MinutaConfig) -> Vec<String> {
        validate_config(config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&MinutaConfig::default()).is_ok());
    }

    #[test]
    fn threshold_out_of_range_fails() {
        let mut config = MinutaConfig::default();
        config.memory.similarity_threshold = 1.5;
        config.memory.exact_match_threshold = 1.6;
        let errors = messages(&config);
        assert!(errors.iter().any(|m| m.contains("similarity_threshold must be between")));
        assert!(errors.iter().any(|m| m.contains("exact_match_threshold must be between")));
    }

    #[test]
    fn exact_tier_below_context_tier_fails() {
        let mut config = MinutaConfig::default();
        config.memory.exact_match_threshold = 0.5;
        let errors = messages(&config);
        assert!(errors.iter().any(|m| m.contains("must not be below")));
    }

    #[test]
    fn managed_backend_requires_index_host() {
        let mut config = MinutaConfig::default();
        config.memory.backend = MemoryBackend::Both;
        assert!(messages(&config).iter().any(|m| m.contains("pinecone.index_host")));

        config.pinecone.index_host = Some("https://idx.svc.pinecone.io".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn disabled_memory_skips_backend_requirements() {
        let mut config = MinutaConfig::default();
        config.memory.enabled = false;
        config.memory.backend = MemoryBackend::Managed;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn azure_flavor_requires_api_version() {
        let mut config = MinutaConfig::default();
        config.openai.flavor = ApiFlavor::Azure;
        assert!(messages(&config).iter().any(|m| m.contains("api_version")));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = MinutaConfig::default();
        config.storage.database_path = " ".into();
        config.server.host = "not a host!".into();
        config.memory.top_k = 0;
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }
}
