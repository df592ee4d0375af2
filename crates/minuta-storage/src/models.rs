// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the conversation store.

use serde::Serialize;

/// One persisted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    /// `system`, `user` or `assistant`.
    pub role: String,
    pub content: String,
    /// Synthesized audio for assistant turns, when speech was requested.
    pub audio_path: Option<String>,
    /// RFC 3339 UTC timestamp with millisecond precision.
    pub created_at: String,
}

impl StoredMessage {
    /// Builds a new row with a fresh id and the current timestamp.
    pub fn new(
        session_id: impl Into<String>,
        role: impl Into<String>,
        content: impl Into<String>,
        audio_path: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            role: role.into(),
            content: content.into(),
            audio_path,
            created_at: now_timestamp(),
        }
    }
}

/// A session as listed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: String,
    /// First user message, shortened; the id when the session has none.
    pub name: String,
    pub message_count: i64,
    pub last_activity: String,
}

pub(crate) fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
