// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selects the reasoning strategy configured in `agent.strategy`.

use std::sync::Arc;

use nsxbot_config::model::{ReasoningConfig, StrategyKind};
use nsxbot_core::CompletionAdapter;

use crate::function_call::FunctionCallLoop;
use crate::observe::Observer;
use crate::prompts;
use crate::react::ReactLoop;
use crate::state::{LoopResult, ReasoningContext};

pub enum ReasoningStrategy {
    React(ReactLoop),
    FunctionCall(FunctionCallLoop),
}

impl ReasoningStrategy {
    pub fn new(
        kind: StrategyKind,
        llm: Arc<dyn CompletionAdapter>,
        observer: Arc<Observer>,
        config: &ReasoningConfig,
    ) -> Self {
        match kind {
            StrategyKind::React => Self::React(ReactLoop::new(llm, observer, config)),
            StrategyKind::FunctionCall => {
                Self::FunctionCall(FunctionCallLoop::new(llm, observer, config))
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::React(_) => StrategyKind::React,
            Self::FunctionCall(_) => StrategyKind::FunctionCall,
        }
    }

    /// The prompt text the first model call will carry, used to reject
    /// messages that cannot fit the budget.
    pub fn initial_prompt(&self, ctx: &ReasoningContext<'_>) -> String {
        match self {
            Self::React(_) => ReactLoop::base_prompt(ctx),
            Self::FunctionCall(_) => format!(
                "{}\nPergunta: {}",
                prompts::function_system_prompt(ctx.domain, ctx.history),
                ctx.message
            ),
        }
    }

    pub async fn run(&self, ctx: &ReasoningContext<'_>) -> LoopResult {
        match self {
            Self::React(react) => react.run(ctx).await,
            Self::FunctionCall(function_call) => function_call.run(ctx).await,
        }
    }
}
