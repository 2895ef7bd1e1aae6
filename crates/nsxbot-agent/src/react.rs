// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Textual ReAct loop.
//!
//! The model continues a transcript one `Pensamento N:` at a time and
//! names an action: `Pesquisar` runs a search whose result is appended as
//! `Observação N:`, `Finalizar` ends the loop with the answer. A malformed
//! action is re-prompted once with the action line forced; a second
//! failure, an LLM error, the step bound or the prompt budget end the loop
//! in `Failed`.

use std::sync::Arc;
use std::time::Instant;

use nsxbot_config::model::ReasoningConfig;
use nsxbot_core::types::{ActionKind, CompletionRequest};
use nsxbot_core::{CompletionAdapter, NsxbotError, count_tokens};
use tracing::{debug, warn};

use crate::faq::UsedQuestions;
use crate::observe::Observer;
use crate::parse::{ParseFailure, ParsedAction, RawReasoning, parse_action, split_reasoning};
use crate::prompts;
use crate::state::{
    FailureReason, LoopOutcome, LoopResult, LoopState, ReasoningContext, ReasoningStep,
};

/// Loop phase with the data each state carries.
enum Phase {
    AwaitingThought,
    AwaitingActionResult { thought: String, action: ParsedAction },
    Done(String),
    Failed(FailureReason),
}

impl Phase {
    fn state(&self) -> LoopState {
        match self {
            Self::AwaitingThought => LoopState::AwaitingThought,
            Self::AwaitingActionResult { .. } => LoopState::AwaitingActionResult,
            Self::Done(_) => LoopState::Done,
            Self::Failed(_) => LoopState::Failed,
        }
    }
}

pub struct ReactLoop {
    llm: Arc<dyn CompletionAdapter>,
    observer: Arc<Observer>,
    max_steps: usize,
    max_tokens_prompt: usize,
}

impl ReactLoop {
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
        }
    }

    /// Prompt the first thought is generated from.
    pub fn base_prompt(ctx: &ReasoningContext<'_>) -> String {
        format!(
            "{}\n{}Mensagem: {}\n",
            prompts::chat_prompt(ctx.domain, ctx.capabilities.search),
            ctx.history,
            ctx.message
        )
    }

    pub async fn run(&self, ctx: &ReasoningContext<'_>) -> LoopResult {
        let permitted = ctx.capabilities.permitted_actions();
        let used = UsedQuestions::default();
        let mut result = LoopResult::empty();
        let mut prompt = Self::base_prompt(ctx);
        let mut step = 0;
        let mut phase = Phase::AwaitingThought;

        loop {
            debug!(index = ctx.index, step, state = %phase.state(), "reasoning loop");
            phase = match phase {
                Phase::AwaitingThought if step >= self.max_steps => {
                    Phase::Failed(FailureReason::StepLimit {
                        max_steps: self.max_steps,
                    })
                }
                Phase::AwaitingThought => {
                    step += 1;
                    match self.think(&prompt, step, &permitted, &mut result).await {
                        Err(e) => Phase::Failed(FailureReason::Llm(e)),
                        Ok(Err(failure)) => {
                            Phase::Failed(FailureReason::MalformedAction(failure.to_string()))
                        }
                        Ok(Ok((thought, action))) if action.kind == ActionKind::Search => {
                            Phase::AwaitingActionResult { thought, action }
                        }
                        Ok(Ok((thought, action))) => {
                            result.steps.push(ReasoningStep {
                                step,
                                thought,
                                action: action.kind,
                                action_input: action.input.clone(),
                                observation: None,
                            });
                            Phase::Done(action.input)
                        }
                    }
                }
                Phase::AwaitingActionResult { thought, action } => {
                    let started = Instant::now();
                    let searches_left = self.max_steps - step;
                    let observed = self
                        .observer
                        .observe(ctx.index, &action.input, &used, searches_left)
                        .await;
                    result.latency.add("observation", started.elapsed());
                    match observed {
                        Err(e) => Phase::Failed(FailureReason::Llm(e)),
                        Ok(observation) => {
                            let iteration = format!(
                                "Pensamento {step}: {thought}\nAção {step}: Pesquisar\n\
                                 Texto da Ação {step}: {}\nObservação {step}: {}\n",
                                action.input, observation.text
                            );
                            result.steps.push(ReasoningStep {
                                step,
                                thought,
                                action: action.kind,
                                action_input: action.input,
                                observation: Some(observation.text),
                            });
                            prompt.push_str(&iteration);
                            let used_tokens = count_tokens(&prompt);
                            if used_tokens > self.max_tokens_prompt {
                                Phase::Failed(FailureReason::PromptBudget {
                                    used: used_tokens,
                                    limit: self.max_tokens_prompt,
                                })
                            } else {
                                Phase::AwaitingThought
                            }
                        }
                    }
                }
                Phase::Done(answer) => {
                    result.outcome = LoopOutcome::Answer(answer);
                    return result;
                }
                Phase::Failed(reason) => {
                    warn!(index = ctx.index, step, code = reason.code(), reason = %reason, "reasoning failed");
                    result.outcome = LoopOutcome::Failed(reason);
                    return result;
                }
            };
        }
    }

    /// One thought and its action, re-prompting once on a malformed action.
    async fn think(
        &self,
        prompt: &str,
        step: usize,
        permitted: &[ActionKind],
        result: &mut LoopResult,
    ) -> Result<Result<(String, ParsedAction), ParseFailure>, NsxbotError> {
        let reasoning_prompt = format!("{prompt}Pensamento {step}:");
        let stop = [format!("Observação {step}:"), "Mensagem:".to_string()];

        let raw = self
            .complete(
                CompletionRequest::prompt(reasoning_prompt.clone()).with_stop(stop.clone()),
                result,
            )
            .await?;
        let RawReasoning { thought, action } = split_reasoning(&raw, step);
        let failure = match action.as_deref().map(|a| parse_action(a, step, permitted)) {
            Some(Ok(parsed)) => return Ok(Ok((thought, parsed))),
            Some(Err(failure)) => failure,
            None => ParseFailure::MissingAction,
        };
        warn!(step, failure = %failure, "malformed action, re-prompting once");

        let forced = format!("{reasoning_prompt} {thought}\nAção {step}:");
        let raw = self
            .complete(CompletionRequest::prompt(forced).with_stop(stop), result)
            .await?;
        Ok(parse_action(&raw, step, permitted).map(|parsed| (thought, parsed)))
    }

    async fn complete(
        &self,
        request: CompletionRequest,
        result: &mut LoopResult,
    ) -> Result<String, NsxbotError> {
        let started = Instant::now();
        let response = self.llm.complete(request).await;
        result.latency.add("llm", started.elapsed());
        result.llm_calls += 1;
        let response = response?;
        result.usage += response.usage;
        Ok(response.text_or_empty())
    }
}
