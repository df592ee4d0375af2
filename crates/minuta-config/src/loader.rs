// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later wins: compiled defaults, `/etc/minuta/minuta.toml`,
//! `~/.config/minuta/minuta.toml`, `./minuta.toml`, then `MINUTA_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MinutaConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "agent", "openai", "storage", "server", "memory", "pinecone", "speech",
];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/minuta/minuta.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "minuta.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("minuta").join("minuta.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard file hierarchy with env var overrides.
pub fn load_config() -> Result<MinutaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MinutaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinutaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MinutaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MinutaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MinutaConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Maps `MINUTA_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `MINUTA_MEMORY_SIMILARITY_THRESHOLD` lands on `memory.similarity_threshold`.
fn env_provider() -> Env {
    Env::prefixed("MINUTA_").map(|key| section_key(key.as_str()).into())
}

fn section_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(section_key("openai_api_key"), "openai.api_key");
        assert_eq!(
            section_key("memory_exact_match_threshold"),
            "memory.exact_match_threshold"
        );
        assert_eq!(section_key("pinecone_index_host"), "pinecone.index_host");
        assert_eq!(section_key("unrelated"), "unrelated");
    }
}
