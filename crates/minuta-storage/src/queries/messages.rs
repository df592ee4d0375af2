// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.

use minuta_core::MinutaError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::StoredMessage;

/// Append one message.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<(), MinutaError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, session_id, role, content, audio_path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.session_id,
                    msg.role,
                    msg.content,
                    msg.audio_path,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of a session in the order they were written.
pub async fn get_messages_for_session(
    db: &Database,
    session_id: &str,
) -> Result<Vec<StoredMessage>, MinutaError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, audio_path, created_at
                 FROM messages WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![session_id], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    role: row.get(2)?,
                    content: row.get(3)?,
                    audio_path: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete every message of a session, returning how many were removed.
pub async fn delete_session_messages(db: &Database, session_id: &str) -> Result<usize, MinutaError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM messages WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}
