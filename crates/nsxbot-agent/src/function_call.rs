// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Function-calling strategy.
//!
//! The model either answers directly or calls
//! [`SEARCH_FUNCTION`](crate::prompts::SEARCH_FUNCTION) with the pieces of
//! information it needs. Every description is searched concurrently, the
//! results are trimmed to the remaining token budget and handed back for a
//! second call that produces the answer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use nsxbot_config::model::ReasoningConfig;
use nsxbot_core::types::{
    ActionKind, ChatMessage, CompletionRequest, CompletionResponse, Directive, FunctionCall,
    FunctionSchema, Role,
};
use nsxbot_core::{CompletionAdapter, NsxbotError, count_tokens};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::faq::UsedQuestions;
use crate::observe::Observer;
use crate::prompts::{self, SEARCH_FUNCTION};
use crate::state::{FailureReason, LoopOutcome, LoopResult, ReasoningContext, ReasoningStep};

/// Arguments of the search function.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArguments {
    #[serde(default)]
    pub pergunta: String,
    /// Each entry maps a description label to the text to search.
    pub informacoes: Vec<BTreeMap<String, String>>,
}

impl SearchArguments {
    /// Parses a call to the search function.
    pub fn from_call(call: &FunctionCall) -> Result<Self, String> {
        if call.name != SEARCH_FUNCTION {
            return Err(format!("unknown function `{}`", call.name));
        }
        serde_json::from_str(&call.arguments).map_err(|e| format!("invalid arguments: {e}"))
    }

    /// `(slot, label, query)` for every non-empty description.
    fn queries(&self) -> Vec<(usize, String, String)> {
        self.informacoes
            .iter()
            .enumerate()
            .flat_map(|(slot, info)| {
                info.iter()
                    .filter(|(_, query)| !query.trim().is_empty())
                    .map(move |(label, query)| (slot, label.clone(), query.clone()))
            })
            .collect()
    }
}

pub struct FunctionCallLoop {
    llm: Arc<dyn CompletionAdapter>,
    observer: Arc<Observer>,
    max_steps: usize,
    max_tokens_prompt: usize,
    max_tokens_call: u32,
    parallel: usize,
}

impl FunctionCallLoop {
    pub fn new(
        llm: Arc<dyn CompletionAdapter>,
        observer: Arc<Observer>,
        config: &ReasoningConfig,
    ) -> Self {
        Self {
            llm,
            observer,
            max_steps: config.max_steps,
            max_tokens_prompt: config.max_tokens_prompt,
            max_tokens_call: config.max_tokens_function_call,
            parallel: config.parallel_observations.max(1),
        }
    }

    pub async fn run(&self, ctx: &ReasoningContext<'_>) -> LoopResult {
        let mut result = LoopResult::empty();
        result.outcome = match self.drive(ctx, &mut result).await {
            Ok(outcome) => outcome,
            Err(e) => LoopOutcome::Failed(FailureReason::Llm(e)),
        };
        if let LoopOutcome::Failed(reason) = &result.outcome {
            warn!(index = ctx.index, code = reason.code(), reason = %reason, "function-call reasoning failed");
        }
        result
    }

    async fn drive(
        &self,
        ctx: &ReasoningContext<'_>,
        result: &mut LoopResult,
    ) -> Result<LoopOutcome, NsxbotError> {
        let mut messages = vec![
            ChatMessage::text(
                Role::System,
                prompts::function_system_prompt(ctx.domain, ctx.history),
            ),
            ChatMessage::text(Role::User, format!("Pergunta: {}", ctx.message)),
        ];
        let functions = if ctx.capabilities.search {
            vec![prompts::search_schema(ctx.domain)]
        } else {
            Vec::new()
        };
        let search_enabled = ctx.capabilities.search;

        let mut step = 1;
        let first = self
            .ask(&mut messages, &functions, &mut step, result, |response| {
                first_move(response, search_enabled)
            })
            .await?;
        let (call, arguments, used_tokens) = match first {
            Err(reason) => return Ok(LoopOutcome::Failed(reason)),
            Ok((FirstMove::Answer(text), _)) => return Ok(self.finish(step, text, result)),
            Ok((FirstMove::Search(call, arguments), used_tokens)) => {
                (call, arguments, used_tokens)
            }
        };

        if step >= self.max_steps {
            return Ok(step_limit(self.max_steps));
        }
        let remaining = self
            .max_tokens_prompt
            .saturating_sub(used_tokens)
            .saturating_sub(self.max_tokens_call as usize);
        let searches_left = self.max_steps.saturating_sub(step);
        let started = Instant::now();
        let observations = self
            .search_all(ctx, &arguments, remaining, searches_left, step, result)
            .await?;
        result.latency.add("observation", started.elapsed());
        let content = serde_json::to_string(&observations)
            .map_err(|e| NsxbotError::Internal(format!("cannot encode observations: {e}")))?;
        debug!(slots = observations.len(), tokens = count_tokens(&content), "search results ready");

        step += 1;
        messages.push(ChatMessage::call(call));
        messages.push(ChatMessage::function_result(SEARCH_FUNCTION, content));
        let answer = self
            .ask(&mut messages, &[], &mut step, result, final_answer)
            .await?;
        Ok(match answer {
            Ok((text, _)) => self.finish(step, text, result),
            Err(reason) => LoopOutcome::Failed(reason),
        })
    }

    /// One completion checked by `validate`. A malformed response is
    /// corrected and re-prompted once; a second one fails.
    async fn ask<T>(
        &self,
        messages: &mut Vec<ChatMessage>,
        functions: &[FunctionSchema],
        step: &mut usize,
        result: &mut LoopResult,
        validate: impl Fn(&CompletionResponse) -> Result<T, Malformed>,
    ) -> Result<Result<(T, usize), FailureReason>, NsxbotError> {
        let response = self.call(messages.clone(), functions.to_vec(), result).await?;
        let malformed = match validate(&response) {
            Ok(value) => return Ok(Ok((value, response.usage.total_tokens as usize))),
            Err(malformed) => malformed,
        };
        warn!(step = *step, detail = %malformed.detail, "malformed model output, re-prompting once");
        if *step >= self.max_steps {
            return Ok(Err(FailureReason::StepLimit {
                max_steps: self.max_steps,
            }));
        }
        *step += 1;
        malformed.correct(messages);

        let response = self.call(messages.clone(), functions.to_vec(), result).await?;
        Ok(match validate(&response) {
            Ok(value) => Ok((value, response.usage.total_tokens as usize)),
            Err(malformed) => Err(FailureReason::MalformedAction(malformed.detail)),
        })
    }

    fn finish(&self, step: usize, text: String, result: &mut LoopResult) -> LoopOutcome {
        result.steps.push(ReasoningStep {
            step,
            thought: String::new(),
            action: ActionKind::Answer,
            action_input: text.clone(),
            observation: None,
        });
        LoopOutcome::Answer(text)
    }

    /// Runs every query with bounded concurrency. Entries that would push
    /// the encoded results past `remaining` tokens are blanked.
    async fn search_all(
        &self,
        ctx: &ReasoningContext<'_>,
        arguments: &SearchArguments,
        remaining: usize,
        searches_left: usize,
        step: usize,
        result: &mut LoopResult,
    ) -> Result<Vec<BTreeMap<String, String>>, NsxbotError> {
        let used = UsedQuestions::default();
        let queries = arguments.queries();
        let mut slots: Vec<BTreeMap<String, String>> =
            vec![BTreeMap::new(); arguments.informacoes.len()];

        let mut completed = futures::stream::iter(queries.into_iter().map(|(slot, label, query)| {
            let used = &used;
            async move {
                let observed = self
                    .observer
                    .observe(ctx.index, &query, used, searches_left)
                    .await;
                (slot, label, query, observed)
            }
        }))
        .buffer_unordered(self.parallel);

        while let Some((slot, label, query, observed)) = completed.next().await {
            let observation = observed?;
            slots[slot].insert(label.clone(), observation.text.clone());
            let encoded = serde_json::to_string(&slots).unwrap_or_default();
            if count_tokens(&encoded) > remaining {
                debug!(slot, label = %label, "search result over budget, dropped");
                slots[slot].insert(label, String::new());
            }
            result.steps.push(ReasoningStep {
                step,
                thought: format!("{} ({})", arguments.pergunta, observation.source),
                action: ActionKind::Search,
                action_input: query,
                observation: Some(observation.text),
            });
        }
        Ok(slots)
    }

    async fn call(
        &self,
        messages: Vec<ChatMessage>,
        functions: Vec<FunctionSchema>,
        result: &mut LoopResult,
    ) -> Result<CompletionResponse, NsxbotError> {
        let request = CompletionRequest {
            messages,
            functions,
            stop: vec!["Pergunta:".to_string()],
            max_tokens: Some(self.max_tokens_call),
        };
        let started = Instant::now();
        let response = self.llm.complete(request).await;
        result.latency.add("llm", started.elapsed());
        result.llm_calls += 1;
        let response = response?;
        result.usage += response.usage;
        Ok(response)
    }
}

/// What the first response asks for.
enum FirstMove {
    Answer(String),
    Search(FunctionCall, SearchArguments),
}

/// A response that cannot be acted on, with what the model is told about it.
struct Malformed {
    detail: String,
    call: Option<FunctionCall>,
}

impl Malformed {
    fn answer(detail: &str) -> Self {
        Self {
            detail: detail.to_string(),
            call: None,
        }
    }

    fn call(call: FunctionCall, detail: String) -> Self {
        Self {
            detail,
            call: Some(call),
        }
    }

    /// Appends the bad output and the correction to the conversation.
    fn correct(self, messages: &mut Vec<ChatMessage>) {
        match self.call {
            Some(call) => {
                let name = call.name.clone();
                messages.push(ChatMessage::call(call));
                messages.push(ChatMessage::function_result(
                    name,
                    format!(
                        "Erro: {}. Chame a função novamente com argumentos JSON válidos \
                         ou responda diretamente à pergunta.",
                        self.detail
                    ),
                ));
            }
            None => messages.push(ChatMessage::text(
                Role::User,
                format!("Erro: {}. Responda à pergunta com um texto.", self.detail),
            )),
        }
    }
}

fn first_move(response: &CompletionResponse, search_enabled: bool) -> Result<FirstMove, Malformed> {
    match response.directive() {
        Directive::Answer(text) if text.is_empty() => Err(Malformed::answer("empty answer")),
        Directive::Answer(text) => Ok(FirstMove::Answer(text)),
        Directive::Call(call) if !search_enabled => Err(Malformed::call(
            call,
            "function call while search is disabled".into(),
        )),
        Directive::Call(call) => match SearchArguments::from_call(&call) {
            Ok(arguments) => Ok(FirstMove::Search(call, arguments)),
            Err(detail) => Err(Malformed::call(call, detail)),
        },
    }
}

fn final_answer(response: &CompletionResponse) -> Result<String, Malformed> {
    match response.directive() {
        Directive::Answer(text) if text.is_empty() => {
            Err(Malformed::answer("empty answer after search"))
        }
        Directive::Answer(text) => Ok(text),
        Directive::Call(call) => {
            let detail = format!("unexpected second call to `{}`", call.name);
            Err(Malformed::call(call, detail))
        }
    }
}

fn step_limit(max_steps: usize) -> LoopOutcome {
    LoopOutcome::Failed(FailureReason::StepLimit { max_steps })
}
