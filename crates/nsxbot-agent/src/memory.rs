// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation memory on top of a [`MemoryStore`], with
//! summarize-and-truncate once a history outgrows its token budget.

use std::sync::Arc;

use nsxbot_core::types::{CompletionRequest, ConversationTurn, Role, UserKey, render_transcript};
use nsxbot_core::{CompletionAdapter, MemoryStore, NsxbotError, count_tokens};
use tracing::{info, warn};

use crate::prompts::{self, SUMMARY_PREFIX};

pub struct MemoryManager {
    store: Arc<dyn MemoryStore>,
    llm: Arc<dyn CompletionAdapter>,
    max_tokens_history: usize,
}

impl MemoryManager {
    pub fn new(
        store: Arc<dyn MemoryStore>,
        llm: Arc<dyn CompletionAdapter>,
        max_tokens_history: usize,
    ) -> Self {
        Self {
            store,
            llm,
            max_tokens_history,
        }
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Transcript for `key` on `index`, ready to embed in a prompt.
    ///
    /// A transcript over the budget is summarized; the stored history is
    /// replaced by a single summary turn and the summary is what the caller
    /// sees. Store failures yield an empty transcript and a failed summary
    /// keeps the full one.
    pub async fn load(&self, key: &UserKey, index: &str) -> String {
        let turns = match self.store.history(key, index).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(user_id = %key.user_id, index, error = %e, code = e.code(), "memory read failed");
                return String::new();
            }
        };
        let transcript = render_transcript(&turns);
        let tokens = count_tokens(&transcript);
        if tokens <= self.max_tokens_history {
            return transcript;
        }

        info!(user_id = %key.user_id, index, tokens, "summarizing conversation history");
        match self.summarize(&turns).await {
            Ok(summary) => {
                let turn = ConversationTurn::system(format!("{SUMMARY_PREFIX}{summary}"));
                let rendered = render_transcript(std::slice::from_ref(&turn));
                if let Err(e) = self.store.replace(key, index, vec![turn]).await {
                    warn!(user_id = %key.user_id, index, error = %e, "failed to store summary");
                }
                rendered
            }
            Err(e) => {
                warn!(user_id = %key.user_id, index, error = %e, code = e.code(), "summarization failed");
                transcript
            }
        }
    }

    async fn summarize(&self, turns: &[ConversationTurn]) -> Result<String, NsxbotError> {
        let (old, new): (Vec<&ConversationTurn>, Vec<&ConversationTurn>) = turns
            .iter()
            .partition(|t| t.role == Role::System && t.content.starts_with(SUMMARY_PREFIX));
        let old_summary = old
            .iter()
            .map(|t| t.content.trim_start_matches(SUMMARY_PREFIX).trim())
            .collect::<Vec<_>>()
            .join(" ");
        let interactions: String = new.iter().map(|t| t.render() + "\n").collect();

        let prompt = prompts::summary_prompt(&old_summary, interactions.trim_end());
        let summary = self
            .llm
            .complete(CompletionRequest::prompt(prompt))
            .await?
            .text_or_empty();
        if summary.is_empty() {
            return Err(NsxbotError::Parse("empty summary".into()));
        }
        Ok(summary)
    }

    /// Appends one exchange to the history.
    pub async fn save(
        &self,
        key: &UserKey,
        index: &str,
        user_message: &str,
        answer: &str,
    ) -> Result<(), NsxbotError> {
        self.store
            .append(
                key,
                index,
                vec![
                    ConversationTurn::user(user_message),
                    ConversationTurn::assistant(answer),
                ],
            )
            .await
    }
}
