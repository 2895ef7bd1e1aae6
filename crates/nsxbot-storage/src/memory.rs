// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local memory store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use nsxbot_core::types::{ConversationTurn, UserKey, UserSession};
use nsxbot_core::{AdapterType, HealthStatus, MemoryStore, NsxbotError, PluginAdapter};

/// `DashMap`-backed store. Sessions live until they expire or the process
/// exits; used for development and evaluation runs.
pub struct InMemoryStore {
    sessions: DashMap<UserKey, UserSession>,
    ttl_secs: u64,
}

impl InMemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs: ttl.as_secs(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Live session for `key`, dropping it first if it has expired.
    fn live(&self, key: &UserKey, now: DateTime<Utc>) -> Option<UserSession> {
        {
            let session = self.sessions.get(key)?;
            if !session.is_expired(now, self.ttl_secs) {
                return Some(session.clone());
            }
        }
        self.sessions
            .remove_if(key, |_, s| s.is_expired(now, self.ttl_secs));
        None
    }

    /// Runs `f` on the live session (a fresh one if missing or expired)
    /// and refreshes its last interaction.
    fn with_session(&self, key: &UserKey, f: impl FnOnce(&mut UserSession)) {
        let now = Utc::now();
        let mut entry = match self.sessions.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now, self.ttl_secs) {
                    occupied.insert(UserSession::new(key.clone()));
                }
                occupied.into_ref()
            }
            Entry::Vacant(vacant) => vacant.insert(UserSession::new(key.clone())),
        };
        f(&mut entry);
        entry.last_interaction = now;
    }
}

#[async_trait]
impl PluginAdapter for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Memory
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn history(
        &self,
        key: &UserKey,
        index: &str,
    ) -> Result<Vec<ConversationTurn>, NsxbotError> {
        Ok(self
            .live(key, Utc::now())
            .and_then(|mut s| s.histories.remove(index))
            .unwrap_or_default())
    }

    async fn append(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError> {
        self.with_session(key, |s| {
            s.histories
                .entry(index.to_string())
                .or_default()
                .extend(turns)
        });
        Ok(())
    }

    async fn replace(
        &self,
        key: &UserKey,
        index: &str,
        turns: Vec<ConversationTurn>,
    ) -> Result<(), NsxbotError> {
        self.with_session(key, |s| {
            s.histories.insert(index.to_string(), turns);
        });
        Ok(())
    }

    async fn clear(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError> {
        if let Some(mut session) = self.sessions.get_mut(key) {
            session.histories.remove(index);
        }
        Ok(())
    }

    async fn set_active_index(&self, key: &UserKey, index: &str) -> Result<(), NsxbotError> {
        self.with_session(key, |s| s.active_index = Some(index.to_string()));
        Ok(())
    }

    async fn active_index(&self, key: &UserKey) -> Result<Option<String>, NsxbotError> {
        Ok(self.live(key, Utc::now()).and_then(|s| s.active_index))
    }

    async fn session(&self, key: &UserKey) -> Result<Option<UserSession>, NsxbotError> {
        Ok(self.live(key, Utc::now()))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, NsxbotError> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.ttl_secs));
        Ok(before - self.sessions.len())
    }
}
