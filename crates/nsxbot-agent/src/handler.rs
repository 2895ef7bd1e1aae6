// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One user message in, one reply out.
//!
//! Order of operations: moderation of the message, FAQ short-circuit,
//! memory load, prompt size guard, reasoning, moderation of the answer,
//! memory append and the audit record.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::types::{Capabilities, InteractionRecord, TokenUsage, UserKey};
use nsxbot_core::{
    CompletionAdapter, FaqScorer, InteractionLog, MemoryStore, ModerationAdapter, NsxbotError,
    SearchAdapter, count_tokens,
};
use strum::Display;
use tracing::{info, warn};

use crate::faq::{FaqBook, FaqTool};
use crate::memory::MemoryManager;
use crate::observe::Observer;
use crate::state::{Latency, LoopOutcome, ReasoningContext, ReasoningStep};
use crate::strategy::ReasoningStrategy;

/// External services the handler is wired to.
pub struct Adapters {
    pub completion: Arc<dyn CompletionAdapter>,
    pub search: Arc<dyn SearchAdapter>,
    pub faq_scorer: Arc<dyn FaqScorer>,
    pub moderation: Option<Arc<dyn ModerationAdapter>>,
    pub memory: Option<Arc<dyn MemoryStore>>,
    pub audit: Option<Arc<dyn InteractionLog>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReplyOutcome {
    /// The reasoning loop produced the answer.
    Answered,
    /// A confident FAQ match answered without reasoning.
    Faq,
    /// Moderation flagged the message or the answer.
    Flagged,
    /// The message did not fit the prompt budget.
    TooLong,
    /// The loop failed and the fallback message was sent.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Reply {
    /// What to send to the user; carries the trace when debug is on.
    pub text: String,
    /// The answer alone.
    pub answer: String,
    pub outcome: ReplyOutcome,
    pub steps: Vec<ReasoningStep>,
    pub trace: String,
    pub usage: TokenUsage,
    /// Seconds per stage, including `total`.
    pub latency: BTreeMap<String, f64>,
}

pub struct ChatHandler {
    config: Arc<NsxbotConfig>,
    capabilities: Capabilities,
    moderation: Option<Arc<dyn ModerationAdapter>>,
    memory: Option<MemoryManager>,
    faq: Option<Arc<FaqTool>>,
    strategy: ReasoningStrategy,
    audit: Option<Arc<dyn InteractionLog>>,
}

impl ChatHandler {
    pub fn new(config: Arc<NsxbotConfig>, adapters: Adapters, faq_book: Arc<FaqBook>) -> Self {
        let features = &config.features;
        let faq = features.faq.then(|| {
            Arc::new(FaqTool::new(
                faq_book,
                adapters.faq_scorer.clone(),
                adapters.completion.clone(),
                &config.faq,
            ))
        });
        let memory = adapters.memory.clone().filter(|_| features.memory).map(|store| {
            MemoryManager::new(
                store,
                adapters.completion.clone(),
                config.memory.max_tokens_history,
            )
        });
        let capabilities = Capabilities {
            memory: memory.is_some(),
            ..features.capabilities()
        };
        let observer = Arc::new(Observer::new(
            adapters.search.clone(),
            faq.clone(),
            features.strategy(),
            config.reasoning.num_docs,
        ));
        let strategy = ReasoningStrategy::new(
            config.agent.strategy,
            adapters.completion.clone(),
            observer,
            &config.reasoning,
        );
        Self {
            capabilities,
            moderation: adapters.moderation.filter(|_| features.moderation),
            memory,
            faq,
            strategy,
            audit: adapters.audit,
            config,
        }
    }

    pub fn config(&self) -> &NsxbotConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn memory_store(&self) -> Option<&Arc<dyn MemoryStore>> {
        self.memory.as_ref().map(MemoryManager::store)
    }

    /// Answers `message` from `user` against search `index`.
    ///
    /// Errors only when moderation cannot classify the message or the
    /// request deadline passes; every reasoning failure becomes a fallback
    /// reply.
    pub async fn respond(
        &self,
        message: &str,
        user: &UserKey,
        index: &str,
    ) -> Result<Reply, NsxbotError> {
        let deadline = Duration::from_secs(self.config.agent.request_timeout_secs);
        tokio::time::timeout(deadline, self.respond_inner(message, user, index))
            .await
            .map_err(|_| NsxbotError::Timeout { duration: deadline })?
    }

    async fn respond_inner(
        &self,
        message: &str,
        user: &UserKey,
        index: &str,
    ) -> Result<Reply, NsxbotError> {
        let started = Instant::now();
        let mut latency = Latency::default();

        if self.is_flagged(message, &mut latency).await? {
            warn!(user_id = %user.user_id, index, "message flagged by moderation");
            let text = self.config.agent.harmful_message.clone();
            return Ok(self
                .finish(user, index, message, text, ReplyOutcome::Flagged, None, latency, started)
                .await);
        }

        if let Some(faq) = &self.faq {
            let t = Instant::now();
            let hit = faq.short_circuit(index, message).await;
            latency.add("faq_short_circuit", t.elapsed());
            if let Some(hit) = hit {
                self.remember(user, index, message, &hit.answer, &mut latency)
                    .await;
                return Ok(self
                    .finish(user, index, message, hit.answer, ReplyOutcome::Faq, None, latency, started)
                    .await);
            }
        }

        let history = match &self.memory {
            Some(memory) => {
                let t = Instant::now();
                let history = memory.load(user, index).await;
                latency.add("memory_get", t.elapsed());
                history
            }
            None => String::new(),
        };
        let domain = self.config.domain_for(index);
        let ctx = ReasoningContext {
            message,
            history: &history,
            index,
            domain: &domain,
            capabilities: self.capabilities,
        };

        let prompt_tokens = count_tokens(&self.strategy.initial_prompt(&ctx));
        if prompt_tokens > self.config.reasoning.max_tokens_prompt {
            info!(user_id = %user.user_id, index, prompt_tokens, "message too long for the prompt budget");
            let text = self.config.agent.too_long_message.clone();
            return Ok(self
                .finish(user, index, message, text, ReplyOutcome::TooLong, None, latency, started)
                .await);
        }

        let t = Instant::now();
        let result = self.strategy.run(&ctx).await;
        latency.add("reasoning", t.elapsed());
        latency.extend(&result.latency);

        let (answer, outcome) = match &result.outcome {
            LoopOutcome::Answer(answer) => (answer.clone(), ReplyOutcome::Answered),
            LoopOutcome::Failed(reason) if reason.is_content_filter() => {
                (self.config.agent.harmful_message.clone(), ReplyOutcome::Flagged)
            }
            LoopOutcome::Failed(_) => {
                (self.config.agent.fallback_message.clone(), ReplyOutcome::Fallback)
            }
        };

        let (answer, outcome) = if outcome == ReplyOutcome::Answered
            && self.is_flagged(&answer, &mut latency).await?
        {
            warn!(user_id = %user.user_id, index, "answer flagged by moderation");
            (self.config.agent.harmful_message.clone(), ReplyOutcome::Flagged)
        } else {
            (answer, outcome)
        };

        if outcome == ReplyOutcome::Answered {
            self.remember(user, index, message, &answer, &mut latency)
                .await;
        }
        Ok(self
            .finish(user, index, message, answer, outcome, Some(result), latency, started)
            .await)
    }

    /// Moderation verdict; always false when moderation is off.
    async fn is_flagged(&self, text: &str, latency: &mut Latency) -> Result<bool, NsxbotError> {
        let Some(moderation) = &self.moderation else {
            return Ok(false);
        };
        let t = Instant::now();
        let flagged = moderation.is_flagged(text).await;
        latency.add("moderation", t.elapsed());
        flagged
    }

    async fn remember(
        &self,
        user: &UserKey,
        index: &str,
        message: &str,
        answer: &str,
        latency: &mut Latency,
    ) {
        let Some(memory) = &self.memory else {
            return;
        };
        let t = Instant::now();
        if let Err(e) = memory.save(user, index, message, answer).await {
            warn!(user_id = %user.user_id, index, error = %e, code = e.code(), "memory write failed");
        }
        latency.add("memory_set", t.elapsed());
    }

    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        user: &UserKey,
        index: &str,
        message: &str,
        answer: String,
        outcome: ReplyOutcome,
        result: Option<crate::state::LoopResult>,
        mut latency: Latency,
        started: Instant,
    ) -> Reply {
        let (steps, trace, usage) = match result {
            Some(result) => {
                let trace = result.trace();
                (result.steps, trace, result.usage)
            }
            None => (Vec::new(), String::new(), TokenUsage::default()),
        };

        if let Some(audit) = &self.audit {
            let t = Instant::now();
            let record = InteractionRecord {
                timestamp: Utc::now(),
                user: user.clone(),
                index: index.to_string(),
                user_message: message.to_string(),
                answer: answer.clone(),
                reasoning: trace.clone(),
                outcome: outcome.to_string(),
                latency: latency.clone().into_map(),
            };
            if let Err(e) = audit.record(&record).await {
                warn!(user_id = %user.user_id, index, error = %e, "audit record failed");
            }
            latency.add("audit", t.elapsed());
        }
        latency.add("total", started.elapsed());

        info!(
            user_id = %user.user_id,
            index,
            outcome = %outcome,
            steps = steps.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "message answered"
        );

        let text = if self.config.agent.return_debug {
            format!("{trace}\nAnswer: {answer}")
        } else {
            answer.clone()
        };
        Reply {
            text,
            answer,
            outcome,
            steps,
            trace,
            usage,
            latency: latency.into_map(),
        }
    }
}
