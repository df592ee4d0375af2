// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `minuta shell` command implementation.
//!
//! An interactive REPL over the same chat service the HTTP API uses. A
//! session is resumed with `--session`, otherwise one is created on the
//! first message.

use colored::Colorize;
use minuta_config::MinutaConfig;
use minuta_core::MinutaError;
use minuta_gateway::{ChatOutcome, ReplySource};
use minuta_memory::MatchTier;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::assemble::build_chat_service;
use crate::serve::init_tracing;

/// Runs the `minuta shell` REPL.
pub async fn run_shell(config: MinutaConfig, session: Option<String>) -> Result<(), MinutaError> {
    init_tracing("warn");

    let chat = build_chat_service(&config).await?;
    let mut session_id = session.filter(|s| !s.trim().is_empty());

    let mut rl = DefaultEditor::new()
        .map_err(|e| MinutaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "minuta shell".bold().green());
    if let Some(id) = &session_id {
        println!("resuming session {}", id.cyan());
    }
    println!("Type {} for a fresh session, {} to exit.\n", "/new".yellow(), "/quit".yellow());

    let prompt = format!("{}> ", "minuta".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed == "/new" {
                    session_id = None;
                    println!("{}", "started a new session".dimmed());
                    continue;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                match chat.chat(trimmed, session_id.as_deref(), false).await {
                    Ok(outcome) => {
                        println!("{}\n", outcome.reply);
                        if let Some(note) = memory_note(&outcome) {
                            println!("{}", note.dimmed());
                        }
                        session_id = Some(outcome.session_id);
                    }
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            // Ctrl+C / Ctrl+D
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    chat.flush_writes().await;
    if let Some(id) = &session_id {
        println!("{}", format!("session: {id}").dimmed());
    }
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// One-line summary of how memory shaped a reply, if it did.
fn memory_note(outcome: &ChatOutcome) -> Option<String> {
    match (outcome.source, outcome.memory.tier) {
        (ReplySource::Memory, _) => Some(format!(
            "[answered from memory, score {:.2}]",
            outcome.memory.score
        )),
        (_, MatchTier::Contextual) => Some(format!(
            "[memory used as context, score {:.2}]",
            outcome.memory.score
        )),
        (ReplySource::Fallback, _) => Some("[model unavailable]".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minuta_memory::MemoryMatch;

    fn outcome(source: ReplySource, memory: MemoryMatch) -> ChatOutcome {
        ChatOutcome {
            session_id: "s1".into(),
            reply: "ok".into(),
            audio_path: None,
            memory,
            source,
        }
    }

    #[test]
    fn memory_reuse_is_noted() {
        let memory = MemoryMatch {
            text: "Paris".into(),
            score: 0.97,
            tier: MatchTier::Exact,
        };
        let note = memory_note(&outcome(ReplySource::Memory, memory)).unwrap();
        assert_eq!(note, "[answered from memory, score 0.97]");
    }

    #[test]
    fn contextual_memory_is_noted() {
        let memory = MemoryMatch {
            text: "User: a\nAssistant: b".into(),
            score: 0.8,
            tier: MatchTier::Contextual,
        };
        let note = memory_note(&outcome(ReplySource::Model, memory)).unwrap();
        assert!(note.contains("context"));
        assert!(note.contains("0.80"));
    }

    #[test]
    fn plain_model_reply_has_no_note() {
        assert!(memory_note(&outcome(ReplySource::Model, MemoryMatch::below_threshold(0.4))).is_none());
        assert!(memory_note(&outcome(ReplySource::Fallback, MemoryMatch::none())).is_some());
    }
}
