// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The chat turn: history, memory lookup, completion, speech and persistence.
//!
//! [`ChatService`] is shared by the HTTP API and the interactive shell. Which
//! memory backends are read and written, and whether speech is available, is
//! decided by what the service is built with.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use minuta_config::MinutaConfig;
use minuta_core::{
    ChatMessage, MinutaError, ProviderAdapter, ProviderRequest, Role, SpeechAdapter,
};
use minuta_memory::{MatchTier, MemoryMatch, MemoryRetriever, MemoryWriter};
use minuta_storage::queries::{messages, sessions};
use minuta_storage::{Database, SessionSummary, StoredMessage};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::session::{audio_file_name, new_session_id};

/// Sessions whose history is kept in process; older ones are reloaded from storage.
pub const DEFAULT_HISTORY_CACHE: usize = 1024;

/// Appended to the last user turn when a related exchange was found.
pub const MEMORY_CONTEXT_HEADER: &str = "\n\nRelevant information from previous exchanges:\n";

/// Static behaviour of a [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub fallback_reply: String,
    pub audio_dir: PathBuf,
}

impl ChatSettings {
    pub fn from_config(config: &MinutaConfig) -> Self {
        Self {
            system_prompt: config.agent.resolve_system_prompt(),
            fallback_reply: config.agent.fallback_reply.clone(),
            audio_dir: PathBuf::from(&config.server.audio_dir),
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// Stored answer reused verbatim.
    Memory,
    /// Generated by the completion provider.
    Model,
    /// Completion failed; the configured apology was sent.
    Fallback,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplySource::Memory => "memory",
            ReplySource::Model => "model",
            ReplySource::Fallback => "fallback",
        }
    }
}

/// Result of one chat turn.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub session_id: String,
    pub reply: String,
    pub audio_path: Option<String>,
    pub memory: MemoryMatch,
    pub source: ReplySource,
}

/// In-process conversation of one session.
struct CachedHistory {
    messages: Vec<ChatMessage>,
    last_used: u64,
}

pub struct ChatService {
    provider: Arc<dyn ProviderAdapter>,
    db: Database,
    retriever: Option<Arc<MemoryRetriever>>,
    writer: Option<Arc<MemoryWriter>>,
    speech: Option<Arc<dyn SpeechAdapter>>,
    histories: DashMap<String, CachedHistory>,
    history_limit: usize,
    clock: AtomicU64,
    writes: TaskTracker,
    settings: ChatSettings,
}

impl ChatService {
    /// A service without memory or speech.
    pub fn new(provider: Arc<dyn ProviderAdapter>, db: Database, settings: ChatSettings) -> Self {
        Self {
            provider,
            db,
            retriever: None,
            writer: None,
            speech: None,
            histories: DashMap::new(),
            history_limit: DEFAULT_HISTORY_CACHE,
            clock: AtomicU64::new(0),
            writes: TaskTracker::new(),
            settings,
        }
    }

    pub fn with_memory(mut self, retriever: Arc<MemoryRetriever>, writer: Arc<MemoryWriter>) -> Self {
        self.retriever = Some(retriever);
        self.writer = Some(writer);
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechAdapter>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Caps how many session histories stay in process (at least one).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Sessions whose history is currently held in process.
    pub fn cached_sessions(&self) -> usize {
        self.histories.len()
    }

    pub fn memory_enabled(&self) -> bool {
        self.retriever.is_some()
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech.is_some()
    }

    /// Runs one turn. `session_id` of `None` (or blank) starts a new session.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<&str>,
        tts: bool,
    ) -> Result<ChatOutcome, MinutaError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(MinutaError::Internal("message is empty".into()));
        }
        let session_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_session_id);

        let history = self.push_user_turn(&session_id, message).await;
        self.persist(StoredMessage::new(&session_id, Role::User.to_string(), message, None))
            .await;

        let memory = match &self.retriever {
            Some(retriever) => retriever.search(&session_id, message).await,
            None => MemoryMatch::none(),
        };

        let (reply, source) = match memory.tier {
            MatchTier::Exact => (memory.text.clone(), ReplySource::Memory),
            MatchTier::Contextual => self.complete(with_memory_context(history, &memory.text)).await,
            MatchTier::None => self.complete(history).await,
        };

        let audio_path = if tts { self.synthesize(&session_id, &reply).await } else { None };

        if let Some(mut cached) = self.histories.get_mut(&session_id) {
            cached.messages.push(ChatMessage::assistant(reply.clone()));
        }
        self.persist(StoredMessage::new(
            &session_id,
            Role::Assistant.to_string(),
            reply.clone(),
            audio_path.clone(),
        ))
        .await;

        if source == ReplySource::Model {
            self.schedule_memory_write(&session_id, message, &reply);
        }

        metrics::counter!("minuta_chat_turns_total", "source" => source.as_str()).increment(1);
        info!(
            session_id = %session_id,
            source = source.as_str(),
            memory_tier = memory.tier.as_str(),
            memory_score = memory.score,
            "chat turn complete"
        );

        Ok(ChatOutcome {
            session_id,
            reply,
            audio_path,
            memory,
            source,
        })
    }

    /// Stored messages of a session, oldest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<StoredMessage>, MinutaError> {
        messages::get_messages_for_session(&self.db, session_id).await
    }

    pub async fn sessions(&self) -> Result<Vec<SessionSummary>, MinutaError> {
        sessions::list_sessions(&self.db).await
    }

    /// Forgets a session everywhere: stored messages, memory records and
    /// in-process history. Returns the number of stored messages removed.
    ///
    /// Scheduled memory writes are drained first so none lands after the
    /// session's records are cleared.
    pub async fn delete_session(&self, session_id: &str) -> Result<usize, MinutaError> {
        self.flush_writes().await;
        let removed = messages::delete_session_messages(&self.db, session_id).await?;
        if let Some(writer) = &self.writer {
            writer.forget(session_id).await;
        }
        self.histories.remove(session_id);
        info!(session_id, removed, "session deleted");
        Ok(removed)
    }

    /// Memory writes still running.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Waits for every scheduled memory write to finish.
    pub async fn flush_writes(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    /// Appends the user turn and returns the conversation to send.
    async fn push_user_turn(&self, session_id: &str, message: &str) -> Vec<ChatMessage> {
        if !self.histories.contains_key(session_id) {
            let restored = self.restore_history(session_id).await;
            self.histories
                .entry(session_id.to_string())
                .or_insert(CachedHistory {
                    messages: restored,
                    last_used: 0,
                });
        }

        let conversation = {
            let mut cached = self.histories.entry(session_id.to_string()).or_insert_with(|| {
                CachedHistory {
                    messages: vec![ChatMessage::system(self.settings.system_prompt.clone())],
                    last_used: 0,
                }
            });
            cached.last_used = self.clock.fetch_add(1, Ordering::Relaxed) + 1;
            cached.messages.push(ChatMessage::user(message));
            cached.messages.clone()
        };
        self.evict_idle_histories();
        conversation
    }

    /// Drops the least recently used histories above the cache limit.
    fn evict_idle_histories(&self) {
        while self.histories.len() > self.history_limit {
            let oldest = self
                .histories
                .iter()
                .min_by_key(|entry| entry.value().last_used)
                .map(|entry| entry.key().clone());
            let Some(session_id) = oldest else {
                break;
            };
            self.histories.remove(&session_id);
            debug!(session_id = %session_id, "evicted idle session history");
        }
    }

    /// System prompt followed by any turns stored for the session.
    async fn restore_history(&self, session_id: &str) -> Vec<ChatMessage> {
        let mut history = vec![ChatMessage::system(self.settings.system_prompt.clone())];
        match messages::get_messages_for_session(&self.db, session_id).await {
            Ok(stored) => {
                if !stored.is_empty() {
                    debug!(session_id, turns = stored.len(), "restored session history");
                }
                history.extend(stored.into_iter().filter_map(|m| match m.role.as_str() {
                    "user" => Some(ChatMessage::user(m.content)),
                    "assistant" => Some(ChatMessage::assistant(m.content)),
                    _ => None,
                }));
            }
            Err(e) => warn!(session_id, error = %e, "could not load session history"),
        }
        history
    }

    async fn complete(&self, conversation: Vec<ChatMessage>) -> (String, ReplySource) {
        match self.provider.complete(ProviderRequest::new(conversation)).await {
            Ok(response) if !response.content.trim().is_empty() => {
                (response.content, ReplySource::Model)
            }
            Ok(_) => {
                warn!(provider = self.provider.name(), "completion returned an empty reply");
                (self.settings.fallback_reply.clone(), ReplySource::Fallback)
            }
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "completion failed");
                (self.settings.fallback_reply.clone(), ReplySource::Fallback)
            }
        }
    }

    async fn synthesize(&self, session_id: &str, reply: &str) -> Option<String> {
        let speech = self.speech.as_ref()?;
        let output = match speech.synthesize(reply).await {
            Ok(output) => output,
            Err(e) => {
                warn!(session_id, error = %e, "speech synthesis failed");
                return None;
            }
        };

        let dir = &self.settings.audio_dir;
        let path = dir.join(audio_file_name(session_id, chrono::Utc::now(), &output.format));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &output.audio).await
        }
        .await;
        match written {
            Ok(()) => Some(path.to_string_lossy().into_owned()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not save audio");
                None
            }
        }
    }

    async fn persist(&self, message: StoredMessage) {
        if let Err(e) = messages::insert_message(&self.db, &message).await {
            error!(session_id = %message.session_id, role = %message.role, error = %e, "failed to store message");
        }
    }

    fn schedule_memory_write(&self, session_id: &str, message: &str, reply: &str) {
        let Some(writer) = self.writer.clone() else {
            return;
        };
        let (session_id, message, reply) = (session_id.to_string(), message.to_string(), reply.to_string());
        self.writes.spawn(async move {
            writer.commit(&session_id, &message, &reply).await;
        });
    }
}

/// Copy of `conversation` whose last user turn carries `memory` as context.
fn with_memory_context(mut conversation: Vec<ChatMessage>, memory: &str) -> Vec<ChatMessage> {
    if let Some(last) = conversation.iter_mut().rev().find(|m| m.role == Role::User) {
        last.content.push_str(MEMORY_CONTEXT_HEADER);
        last.content.push_str(memory);
    }
    conversation
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use minuta_memory::{
        EmbedMode, Embedder, RecordFormat, RetrievalSettings, WriteTarget,
    };
    use minuta_test_utils::{InMemoryIndex, MockProvider, SlowEmbedder};

    fn settings() -> ChatSettings {
        ChatSettings {
            system_prompt: "sys".into(),
            fallback_reply: "sorry".into(),
            audio_dir: std::env::temp_dir(),
        }
    }

    async fn service(provider: &MockProvider) -> ChatService {
        let db = Database::open_in_memory().await.unwrap();
        ChatService::new(Arc::new(provider.clone()), db, settings())
    }

    #[test]
    fn memory_context_goes_on_last_user_turn() {
        let conversation = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
        ];
        let out = with_memory_context(conversation, "User: q\nAssistant: a");
        assert_eq!(out[1].content, "first");
        assert_eq!(
            out[3].content,
            "second\n\nRelevant information from previous exchanges:\nUser: q\nAssistant: a"
        );
    }

    #[test]
    fn reply_source_labels() {
        assert_eq!(ReplySource::Memory.as_str(), "memory");
        assert_eq!(ReplySource::Model.as_str(), "model");
        assert_eq!(ReplySource::Fallback.as_str(), "fallback");
    }

    #[tokio::test]
    async fn delete_waits_for_pending_memory_write() {
        let provider = MockProvider::new();
        let index = Arc::new(InMemoryIndex::new());
        let embedder = Arc::new(Embedder::new(Arc::new(SlowEmbedder::new(
            Duration::from_millis(200),
        ))));
        let retriever = MemoryRetriever::new(
            embedder.clone(),
            vec![index.clone()],
            RetrievalSettings::default(),
        );
        let writer = MemoryWriter::new(
            embedder,
            vec![WriteTarget::new(index.clone(), RecordFormat::Plain)],
            EmbedMode::Local,
        );
        let chat = service(&provider)
            .await
            .with_memory(Arc::new(retriever), Arc::new(writer));

        let outcome = chat.chat("When is the launch?", Some("s1"), false).await.unwrap();
        assert_eq!(outcome.source, ReplySource::Model);
        assert_eq!(chat.pending_writes(), 1);

        chat.delete_session("s1").await.unwrap();
        assert_eq!(chat.pending_writes(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(index.records().is_empty());
    }

    #[tokio::test]
    async fn history_cache_evicts_least_recent_session() {
        let provider = MockProvider::new();
        let chat = service(&provider).await.with_history_limit(2);

        chat.chat("one", Some("s1"), false).await.unwrap();
        chat.chat("two", Some("s2"), false).await.unwrap();
        chat.chat("three", Some("s3"), false).await.unwrap();
        assert_eq!(chat.cached_sessions(), 2);

        // s1 was evicted; its turns come back from storage.
        chat.chat("again", Some("s1"), false).await.unwrap();
        assert_eq!(chat.cached_sessions(), 2);

        let sent = provider.requests().pop().unwrap().messages;
        let contents: Vec<_> = sent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["sys", "one", "mock response", "again"]);
    }

    #[tokio::test]
    async fn active_session_survives_eviction() {
        let provider = MockProvider::new();
        let chat = service(&provider).await.with_history_limit(1);

        chat.chat("first", Some("s1"), false).await.unwrap();
        chat.chat("other", Some("s2"), false).await.unwrap();
        chat.chat("second", Some("s1"), false).await.unwrap();

        assert_eq!(chat.cached_sessions(), 1);
        let sent = provider.requests().pop().unwrap().messages;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[3].content, "second");
    }
}
