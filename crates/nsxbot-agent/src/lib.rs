// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reasoning core of nsxbot.
//!
//! [`ChatHandler`] turns one user message into one reply. It drives either
//! the textual ReAct loop ([`ReactLoop`]) or the function-calling loop
//! ([`FunctionCallLoop`]), both bounded by `reasoning.max_steps` and
//! ending in `Done` or `Failed`.

pub mod faq;
pub mod function_call;
pub mod handler;
pub mod memory;
pub mod observe;
pub mod parse;
pub mod prompts;
pub mod react;
pub mod state;
pub mod strategy;

pub use faq::{FaqBook, FaqTool};
pub use function_call::FunctionCallLoop;
pub use handler::{Adapters, ChatHandler, Reply, ReplyOutcome};
pub use memory::MemoryManager;
pub use react::ReactLoop;
pub use state::{FailureReason, LoopOutcome, LoopResult, LoopState, ReasoningContext, ReasoningStep};
pub use strategy::ReasoningStrategy;
