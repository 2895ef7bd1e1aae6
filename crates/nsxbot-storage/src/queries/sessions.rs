// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session rows: active index and last interaction time per user.

use chrono::{DateTime, Utc};
use nsxbot_core::NsxbotError;
use nsxbot_core::types::UserKey;
use rusqlite::{OptionalExtension, params};

use super::{from_millis, to_millis};
use crate::database::{Database, map_tr_err};

/// Session columns as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub active_index: Option<String>,
    pub last_interaction: DateTime<Utc>,
}

/// Inserts the session or refreshes its `last_interaction`.
pub(crate) fn touch_sync(
    conn: &rusqlite::Connection,
    key: &UserKey,
    now: DateTime<Utc>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO sessions (user_key, user_id, chatbot_id, active_index, last_interaction)
         VALUES (?1, ?2, ?3, NULL, ?4)
         ON CONFLICT(user_key) DO UPDATE SET last_interaction = excluded.last_interaction",
        params![key.storage_key(), key.user_id, key.chatbot_id, to_millis(now)],
    )?;
    Ok(())
}

/// Deletes the session if it went idle before `cutoff`, so a write after
/// expiry starts from an empty session.
pub(crate) fn drop_if_expired_sync(
    conn: &rusqlite::Connection,
    key: &UserKey,
    cutoff: DateTime<Utc>,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE user_key = ?1 AND last_interaction < ?2",
        params![key.storage_key(), to_millis(cutoff)],
    )?;
    Ok(())
}

/// Sets the active index, creating the session if needed.
pub async fn set_active_index(
    db: &Database,
    key: &UserKey,
    index: &str,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> Result<(), NsxbotError> {
    let key = key.clone();
    let index = index.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            drop_if_expired_sync(conn, &key, cutoff)?;
            touch_sync(conn, &key, now)?;
            conn.execute(
                "UPDATE sessions SET active_index = ?2 WHERE user_key = ?1",
                params![key.storage_key(), index],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetches the session if it was active at or after `cutoff`.
pub async fn get_live(
    db: &Database,
    key: &UserKey,
    cutoff: DateTime<Utc>,
) -> Result<Option<SessionRow>, NsxbotError> {
    let storage_key = key.storage_key();
    db.connection()
        .call(move |conn| -> Result<Option<SessionRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT active_index, last_interaction FROM sessions
                 WHERE user_key = ?1 AND last_interaction >= ?2",
                params![storage_key, to_millis(cutoff)],
                |row| {
                    Ok(SessionRow {
                        active_index: row.get(0)?,
                        last_interaction: from_millis(row.get(1)?),
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes sessions idle since before `cutoff`; their turns cascade.
pub async fn purge_before(db: &Database, cutoff: DateTime<Utc>) -> Result<usize, NsxbotError> {
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM sessions WHERE last_interaction < ?1",
                params![to_millis(cutoff)],
            )
        })
        .await
        .map_err(map_tr_err)
}
