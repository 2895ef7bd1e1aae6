// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-facing adapters: completion and moderation.

use async_trait::async_trait;

use crate::error::NsxbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for the completion service ("prompt answerer").
///
/// A response carries either text or a structured function call; see
/// [`CompletionResponse::directive`](crate::types::CompletionResponse::directive).
#[async_trait]
pub trait CompletionAdapter: PluginAdapter {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, NsxbotError>;
}

/// Adapter for the content moderation service.
#[async_trait]
pub trait ModerationAdapter: PluginAdapter {
    /// Returns true when the text should not be processed or sent.
    async fn is_flagged(&self, text: &str) -> Result<bool, NsxbotError>;
}
