// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session listing derived from stored messages.

use minuta_core::MinutaError;

use crate::database::{map_tr_err, Database};
use crate::models::SessionSummary;

/// Longest session name, in characters.
const NAME_MAX_CHARS: usize = 60;

/// Every session with stored messages, most recently active first.
pub async fn list_sessions(db: &Database) -> Result<Vec<SessionSummary>, MinutaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.session_id, COUNT(*), MAX(m.created_at),
                        (SELECT f.content FROM messages f
                         WHERE f.session_id = m.session_id AND f.role = 'user'
                         ORDER BY f.created_at ASC, f.rowid ASC LIMIT 1)
                 FROM messages m
                 GROUP BY m.session_id
                 ORDER BY MAX(m.created_at) DESC, m.session_id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let first_user: Option<String> = row.get(3)?;
                Ok(SessionSummary {
                    name: session_name(first_user.as_deref(), &id),
                    id,
                    message_count: row.get(1)?,
                    last_activity: row.get(2)?,
                })
            })?;
            let mut sessions = Vec::new();
            for row in rows {
                sessions.push(row?);
            }
            Ok(sessions)
        })
        .await
        .map_err(map_tr_err)
}

fn session_name(first_user_message: Option<&str>, id: &str) -> String {
    let text = first_user_message
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(id);
    if text.chars().count() <= NAME_MAX_CHARS {
        return text.to_string();
    }
    let mut name: String = text.chars().take(NAME_MAX_CHARS - 3).collect();
    name.push_str("...");
    name
}
