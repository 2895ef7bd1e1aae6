// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end handler testing.
//!
//! `TestHarness` assembles a [`ChatHandler`] from mock adapters, with
//! either the in-memory store or a temp SQLite database, and exposes
//! `send()` to drive one message through the whole pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use nsxbot_agent::{Adapters, ChatHandler, FaqBook, Reply};
use nsxbot_config::NsxbotConfig;
use nsxbot_core::types::{ConversationTurn, UserKey};
use nsxbot_core::{InteractionLog, MemoryStore, ModerationAdapter, NsxbotError};
use nsxbot_storage::{Database, InMemoryStore, SqliteInteractionLog, SqliteStore};

use crate::mock_completion::MockCompletion;
use crate::mock_search::{MockFaqScorer, MockModeration, MockSearch};

/// Index every harness message targets unless told otherwise.
pub const TEST_INDEX: &str = "FUNDEP_Ciencias";

/// Builder for test environments.
pub struct TestHarnessBuilder {
    config: NsxbotConfig,
    completions: Vec<String>,
    search: MockSearch,
    scorer: MockFaqScorer,
    moderation: Option<MockModeration>,
    faq: FaqBook,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = NsxbotConfig::default();
        config.features.moderation = false;
        Self {
            config,
            completions: Vec::new(),
            search: MockSearch::new(),
            scorer: MockFaqScorer::new(),
            moderation: None,
            faq: FaqBook::default(),
            sqlite: false,
        }
    }

    /// Adjust the configuration before the handler is built.
    pub fn with_config(mut self, edit: impl FnOnce(&mut NsxbotConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Scripted completion texts, consumed in order.
    pub fn with_completions<I, S>(mut self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completions = texts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, search: MockSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_scorer(mut self, scorer: MockFaqScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Enables moderation with the given mock.
    pub fn with_moderation(mut self, moderation: MockModeration) -> Self {
        self.config.features.moderation = true;
        self.moderation = Some(moderation);
        self
    }

    /// FAQ entries for [`TEST_INDEX`].
    pub fn with_faq<I, Q, A>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: Into<String>,
        A: Into<String>,
    {
        let set: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(q, a)| (q.into(), a.into()))
            .collect();
        self.faq.insert(TEST_INDEX, set);
        self
    }

    /// Use a temp SQLite database with the audit log instead of the
    /// in-memory store.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, NsxbotError> {
        let expiration = self.config.memory.expiration_secs;
        let mut audit = None;
        let mut temp_dir = None;
        let memory: Arc<dyn MemoryStore> = if self.sqlite {
            let dir = tempfile::TempDir::new().map_err(NsxbotError::storage)?;
            let path = dir.path().join("nsxbot.db");
            let db = Database::open(&path.to_string_lossy()).await?;
            audit = Some(Arc::new(SqliteInteractionLog::new(db.clone())));
            temp_dir = Some(dir);
            Arc::new(SqliteStore::with_database(db, expiration))
        } else {
            Arc::new(InMemoryStore::new(Duration::from_secs(expiration)))
        };

        let completion = Arc::new(MockCompletion::with_texts(self.completions));
        let search = Arc::new(self.search);
        let scorer = Arc::new(self.scorer);
        let moderation = self.moderation.map(Arc::new);
        let config = Arc::new(self.config);

        let adapters = Adapters {
            completion: completion.clone(),
            search: search.clone(),
            faq_scorer: scorer.clone(),
            moderation: moderation
                .clone()
                .map(|m| m as Arc<dyn ModerationAdapter>),
            memory: Some(memory.clone()),
            audit: audit.clone().map(|a| a as Arc<dyn InteractionLog>),
        };
        let handler = Arc::new(ChatHandler::new(
            config.clone(),
            adapters,
            Arc::new(self.faq),
        ));

        Ok(TestHarness {
            handler,
            completion,
            search,
            scorer,
            moderation,
            memory,
            audit,
            config,
            user: UserKey::new("5531988887777", "5531999990000"),
            _temp_dir: temp_dir,
        })
    }
}

/// A handler wired to mocks, plus the mocks for assertions.
pub struct TestHarness {
    pub handler: Arc<ChatHandler>,
    pub completion: Arc<MockCompletion>,
    pub search: Arc<MockSearch>,
    pub scorer: Arc<MockFaqScorer>,
    pub moderation: Option<Arc<MockModeration>>,
    pub memory: Arc<dyn MemoryStore>,
    /// Present with [`TestHarnessBuilder::with_sqlite`].
    pub audit: Option<Arc<SqliteInteractionLog>>,
    pub config: Arc<NsxbotConfig>,
    /// Sender of every `send()` message.
    pub user: UserKey,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Sends `text` from the harness user to [`TEST_INDEX`].
    pub async fn send(&self, text: &str) -> Result<Reply, NsxbotError> {
        self.handler.respond(text, &self.user, TEST_INDEX).await
    }

    /// Stored transcript of the harness user on [`TEST_INDEX`].
    pub async fn history(&self) -> Result<Vec<ConversationTurn>, NsxbotError> {
        self.memory.history(&self.user, TEST_INDEX).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxbot_agent::ReplyOutcome;

    #[tokio::test]
    async fn direct_answer_goes_through_the_handler() {
        let harness = TestHarness::builder()
            .with_config(|c| c.features.faq = false)
            .with_completions([" Olá!\nAção 1: Finalizar[Olá, como posso ajudar?]"])
            .build()
            .await
            .unwrap();

        let reply = harness.send("oi").await.unwrap();
        assert_eq!(reply.outcome, ReplyOutcome::Answered);
        assert_eq!(reply.text, "Olá, como posso ajudar?");
        assert_eq!(harness.history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sqlite_harness_records_interactions() {
        let harness = TestHarness::builder()
            .with_config(|c| c.features.faq = false)
            .with_completions([" Resposta direta.\nAção 1: Finalizar[Sim.]"])
            .with_sqlite()
            .build()
            .await
            .unwrap();

        harness.send("pergunta").await.unwrap();
        let audit = harness.audit.as_ref().unwrap();
        let records = audit.recent(&harness.user, 10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "Sim.");
        assert_eq!(records[0].outcome, "answered");
    }
}
