// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minuta - a meeting-notes chat assistant that remembers.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod assemble;
mod serve;
mod shell;

use clap::{Parser, Subcommand};

/// Minuta - a meeting-notes chat assistant that remembers.
#[derive(Parser, Debug)]
#[command(name = "minuta", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
    /// Chat in the terminal.
    Shell {
        /// Continue an existing session instead of starting a new one.
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match minuta_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            minuta_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Shell { session }) => shell::run_shell(config, session).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("minuta: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("minuta: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &minuta_config::MinutaConfig) -> Result<(), minuta_core::MinutaError> {
    let mut redacted = config.clone();
    for key in [&mut redacted.openai.api_key, &mut redacted.pinecone.api_key] {
        if key.is_some() {
            *key = Some("[redacted]".to_string());
        }
    }
    let text = toml::to_string_pretty(&redacted)
        .map_err(|e| minuta_core::MinutaError::Config(format!("cannot render config: {e}")))?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shell_accepts_session() {
        let cli = Cli::parse_from(["minuta", "shell", "--session", "20260301T101500_session-a1b2c3"]);
        match cli.command {
            Some(Commands::Shell { session }) => {
                assert_eq!(session.as_deref(), Some("20260301T101500_session-a1b2c3"));
            }
            other => panic!("expected shell, got {other:?}"),
        }
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = minuta_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "minuta");
    }

    #[test]
    fn printed_config_round_trips() {
        let mut config = minuta_config::load_and_validate_str("").unwrap();
        config.openai.api_key = Some("sk-secret".into());
        let text = {
            let mut redacted = config.clone();
            redacted.openai.api_key = Some("[redacted]".into());
            toml::to_string_pretty(&redacted).unwrap()
        };
        assert!(!text.contains("sk-secret"));
        assert!(minuta_config::load_and_validate_str(&text).is_ok());
        assert!(print_config(&config).is_ok());
    }
}
