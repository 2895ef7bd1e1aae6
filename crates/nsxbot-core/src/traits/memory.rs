// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation memory and the interaction audit log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NsxbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationTurn, InteractionRecord, UserKey, UserSession};

/// Keyed store of ordered conversation turns.
///
/// Histories are kept per `(user, index)` pair so switching search index
/// starts a fresh conversation. Any write refreshes the session's
/// `last_interaction`; sessions idle past the configured expiration are
/// removed by [`purge_expired`](MemoryStore::purge_expired) and are
/// invisible to reads in the meantime.
#[async_trait]
pub trait MemoryStore: PluginAdapter {
    /// Ordered history for `key` on `index`; empty when unknown or expired.
    async fn history(
        &self,
        key: &UserKey,
        index: &str,
    ) -> Result<Vec<ConversationTurn>, NsxbotError>;

    /// Appends turns to the end of the history.
    async fn append(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError>;

    /// Replaces the whole history (used after summarization).
    async fn replace(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError>;

    /// Drops the history for one index.
    async fn clear(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError>;

    /// Records the index the user picked from the menu.
    async fn set_active_index(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError>;

    /// The index the user last picked, if the session is still alive.
    async fn active_index(&self, key: &UserKey) -> Result<Option<String>, NsxbotError>;

    /// Full session snapshot, `None` when unknown or expired.
    async fn session(&self, key: &UserKey) -> Result<Option<UserSession>, NsxbotError>;

    /// Removes every session idle past the expiration at `now`; returns how many.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, NsxbotError>;
}

/// Append-only sink for answered interactions.
#[async_trait]
pub trait InteractionLog: Send + Sync {
    async fn record(&self, record: &InteractionRecord) -> Result<(), NsxbotError>;
}
