// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn rows.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use nsxbot_core::NsxbotError;
use nsxbot_core::types::{ConversationTurn, Role, UserKey};
use rusqlite::params;

use super::sessions::{drop_if_expired_sync, touch_sync};
use super::{from_millis, to_millis};
use crate::database::{Database, map_tr_err};

fn row_to_turn(role: String, content: String, created_at: i64) -> ConversationTurn {
    ConversationTurn {
        role: Role::from_str(&role).unwrap_or(Role::System),
        content,
        timestamp: from_millis(created_at),
    }
}

/// Turns for one user and index, oldest first.
pub async fn list(
    db: &Database,
    key: &UserKey,
    index: &str,
) -> Result<Vec<ConversationTurn>, NsxbotError> {
    let storage_key = key.storage_key();
    let index = index.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<ConversationTurn>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT role, content, created_at FROM turns
                 WHERE user_key = ?1 AND search_index = ?2 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![storage_key, index], |row| {
                Ok(row_to_turn(row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// All turns of a user grouped by index.
pub async fn list_all(
    db: &Database,
    key: &UserKey,
) -> Result<BTreeMap<String, Vec<ConversationTurn>>, NsxbotError> {
    let storage_key = key.storage_key();
    db.connection()
        .call(
            move |conn| -> Result<BTreeMap<String, Vec<ConversationTurn>>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT search_index, role, content, created_at FROM turns
                     WHERE user_key = ?1 ORDER BY id ASC",
                )?;
                let mut rows = stmt.query(params![storage_key])?;
                let mut grouped: BTreeMap<String, Vec<ConversationTurn>> = BTreeMap::new();
                while let Some(row) = rows.next()? {
                    let index: String = row.get(0)?;
                    grouped
                        .entry(index)
                        .or_default()
                        .push(row_to_turn(row.get(1)?, row.get(2)?, row.get(3)?));
                }
                Ok(grouped)
            },
        )
        .await
        .map_err(map_tr_err)
}

/// Appends turns (optionally replacing existing ones) in one transaction,
/// refreshing the session's last interaction.
pub async fn write(
    db: &Database,
    key: &UserKey,
    index: &str,
    turns: Vec<ConversationTurn>,
    replace: bool,
    now: DateTime<Utc>,
    cutoff: DateTime<Utc>,
) -> Result<(), NsxbotError> {
    let key = key.clone();
    let index = index.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            drop_if_expired_sync(&tx, &key, cutoff)?;
            touch_sync(&tx, &key, now)?;
            if replace {
                tx.execute(
                    "DELETE FROM turns WHERE user_key = ?1 AND search_index = ?2",
                    params![key.storage_key(), index],
                )?;
            }
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO turns (user_key, search_index, role, content, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for turn in &turns {
                    stmt.execute(params![
                        key.storage_key(),
                        index,
                        turn.role.to_string(),
                        turn.content,
                        to_millis(turn.timestamp),
                    ])?;
                }
            }
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear(db: &Database, key: &UserKey, index: &str) -> Result<(), NsxbotError> {
    let storage_key = key.storage_key();
    let index = index.to_string();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "DELETE FROM turns WHERE user_key = ?1 AND search_index = ?2",
                params![storage_key, index],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
