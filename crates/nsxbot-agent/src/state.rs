// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! States, steps and results shared by the reasoning strategies.

use std::collections::BTreeMap;
use std::time::Duration;

use nsxbot_core::NsxbotError;
use nsxbot_core::types::{ActionKind, Capabilities, TokenUsage};
use strum::Display;

/// Reasoning loop states.
///
/// Each message starts in `AwaitingThought`. A search action moves the loop
/// to `AwaitingActionResult`, whose observation brings it back to
/// `AwaitingThought`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopState {
    AwaitingThought,
    AwaitingActionResult,
    Done,
    Failed,
}

/// One Thought / Action / Observation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningStep {
    pub step: usize,
    pub thought: String,
    pub action: ActionKind,
    pub action_input: String,
    pub observation: Option<String>,
}

/// Why a loop ended in `Failed`.
#[derive(Debug)]
pub enum FailureReason {
    /// The step bound was reached without a final answer.
    StepLimit { max_steps: usize },
    /// The model produced an unusable action twice in a row.
    MalformedAction(String),
    /// The reasoning prompt outgrew its token budget.
    PromptBudget { used: usize, limit: usize },
    /// The completion service failed.
    Llm(NsxbotError),
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StepLimit { .. } => "STEP_LIMIT",
            Self::MalformedAction(_) => "PARSE",
            Self::PromptBudget { .. } => "MAX_TOKENS",
            Self::Llm(e) => e.code(),
        }
    }

    pub fn is_content_filter(&self) -> bool {
        matches!(self, Self::Llm(NsxbotError::ContentFiltered { .. }))
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StepLimit { max_steps } => write!(f, "no answer within {max_steps} steps"),
            Self::MalformedAction(detail) => write!(f, "malformed action: {detail}"),
            Self::PromptBudget { used, limit } => {
                write!(f, "reasoning prompt uses {used} tokens, limit is {limit}")
            }
            Self::Llm(e) => write!(f, "completion failed: {e}"),
        }
    }
}

#[derive(Debug)]
pub enum LoopOutcome {
    Answer(String),
    Failed(FailureReason),
}

impl LoopOutcome {
    pub fn state(&self) -> LoopState {
        match self {
            Self::Answer(_) => LoopState::Done,
            Self::Failed(_) => LoopState::Failed,
        }
    }
}

/// What one message's inputs look like to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct ReasoningContext<'a> {
    pub message: &'a str,
    /// Rendered transcript; empty when memory is off or there is none.
    pub history: &'a str,
    pub index: &'a str,
    pub domain: &'a str,
    pub capabilities: Capabilities,
}

/// Seconds spent per stage, summed across calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Latency(BTreeMap<String, f64>);

impl Latency {
    pub fn add(&mut self, stage: &str, elapsed: Duration) {
        *self.0.entry(stage.to_string()).or_default() += elapsed.as_secs_f64();
    }

    pub fn extend(&mut self, other: &Latency) {
        for (stage, secs) in &other.0 {
            *self.0.entry(stage.clone()).or_default() += secs;
        }
    }

    pub fn get(&self, stage: &str) -> Option<f64> {
        self.0.get(stage).copied()
    }

    pub fn into_map(self) -> BTreeMap<String, f64> {
        self.0
    }
}

#[derive(Debug)]
pub struct LoopResult {
    pub outcome: LoopOutcome,
    pub steps: Vec<ReasoningStep>,
    pub usage: TokenUsage,
    pub llm_calls: usize,
    pub latency: Latency,
}

impl LoopResult {
    pub(crate) fn empty() -> Self {
        Self {
            outcome: LoopOutcome::Answer(String::new()),
            steps: Vec::new(),
            usage: TokenUsage::default(),
            llm_calls: 0,
            latency: Latency::default(),
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            LoopOutcome::Answer(text) => Some(text),
            LoopOutcome::Failed(_) => None,
        }
    }

    pub fn searches(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.action == ActionKind::Search)
            .count()
    }

    /// Debug rendering: `Thought N`, `Action N` and `Observation N` lines.
    pub fn trace(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            let n = step.step;
            out.push_str(&format!("Thought {n}: {}\n", step.thought));
            out.push_str(&format!(
                "Action {n}: {}[{}]\n",
                step.action.keyword(),
                step.action_input
            ));
            if let Some(observation) = &step.observation {
                out.push_str(&format!("Observation {n}: {observation}\n"));
            }
        }
        if let LoopOutcome::Failed(reason) = &self.outcome {
            out.push_str(&format!("Failed: {reason}\n"));
        }
        out
    }
}
