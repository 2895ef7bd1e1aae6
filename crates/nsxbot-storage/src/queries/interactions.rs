// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interaction audit rows.

use nsxbot_core::NsxbotError;
use nsxbot_core::types::{InteractionRecord, UserKey};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

pub async fn insert(db: &Database, record: &InteractionRecord) -> Result<(), NsxbotError> {
    let latency = serde_json::to_string(&record.latency).map_err(NsxbotError::storage)?;
    let record = record.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO interactions
                 (created_at, user_id, chatbot_id, search_index, user_message, answer, reasoning, outcome, latency)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.timestamp.to_rfc3339(),
                    record.user.user_id,
                    record.user.chatbot_id,
                    record.index,
                    record.user_message,
                    record.answer,
                    record.reasoning,
                    record.outcome,
                    latency,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent interactions for a user, newest first.
pub async fn recent_for_user(
    db: &Database,
    key: &UserKey,
    limit: usize,
) -> Result<Vec<InteractionRecord>, NsxbotError> {
    let key = key.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<InteractionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT created_at, search_index, user_message, answer, reasoning, outcome, latency
                 FROM interactions WHERE user_id = ?1 AND chatbot_id = ?2
                 ORDER BY id DESC LIMIT ?3",
            )?;
            let rows = stmt.query_map(
                params![key.user_id, key.chatbot_id, limit as i64],
                |row| {
                    let created_at: String = row.get(0)?;
                    let latency: String = row.get(6)?;
                    Ok(InteractionRecord {
                        timestamp: chrono::DateTime::parse_from_rfc3339(&created_at)
                            .map(|t| t.to_utc())
                            .unwrap_or_default(),
                        user: key.clone(),
                        index: row.get(1)?,
                        user_message: row.get(2)?,
                        answer: row.get(3)?,
                        reasoning: row.get(4)?,
                        outcome: row.get(5)?,
                        latency: serde_json::from_str(&latency).unwrap_or_default(),
                    })
                },
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
