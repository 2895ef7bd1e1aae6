// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt answerer adapter for nsxbot.
//!
//! Implements [`CompletionAdapter`] against the prompt answerer service,
//! which fronts the chat model and supports function calling. Moderation
//! lives in [`moderation`].

pub mod client;
pub mod moderation;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::model::LlmConfig;
use nsxbot_core::types::{AdapterType, CompletionRequest, CompletionResponse, HealthStatus};
use nsxbot_core::{CompletionAdapter, NsxbotError, PluginAdapter};
use tracing::{debug, warn};

use crate::client::ServiceClient;
use crate::types::{AnswererRequest, AnswererResponse, Configurations};

pub use moderation::ModerationClient;

/// Finish reason the service reports when its content filter withheld output.
const CONTENT_FILTER_FINISH: &str = "content_filter";

/// Completion adapter backed by the prompt answerer HTTP service.
pub struct PromptAnswererProvider {
    http: ServiceClient,
    model: String,
    service: String,
    max_tokens: u32,
}

impl PromptAnswererProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, NsxbotError> {
        Self::with_model(config, config.model.clone())
    }

    /// Same endpoint, different model; the evaluator grades with its own.
    pub fn with_model(config: &LlmConfig, model: String) -> Result<Self, NsxbotError> {
        Ok(Self {
            http: ServiceClient::new(
                config.completion_endpoint.clone(),
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?,
            model,
            service: config.service.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_wire(&self, request: CompletionRequest) -> AnswererRequest {
        let stop = if request.stop.is_empty() && request.functions.is_empty() {
            vec!["\n".to_string()]
        } else {
            request.stop
        };
        AnswererRequest {
            service: self.service.clone(),
            prompt: request.messages,
            model: self.model.clone(),
            configurations: Configurations::greedy(
                request.max_tokens.unwrap_or(self.max_tokens),
                stop,
            ),
            functions: request.functions,
        }
    }
}

#[async_trait]
impl PluginAdapter for PromptAnswererProvider {
    fn name(&self) -> &str {
        "prompt-answerer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CompletionAdapter for PromptAnswererProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, NsxbotError> {
        let body = self.to_wire(request);
        let response: AnswererResponse = self
            .http
            .post_json(&body, |status, text| {
                NsxbotError::provider(format!("prompt answerer returned {status}: {text}"))
            })
            .await?;

        if response.finish_reason.as_deref() == Some(CONTENT_FILTER_FINISH) {
            let reason = response
                .content_filter_results
                .as_ref()
                .and_then(|r| r.reason())
                .unwrap_or_else(|| "content filter triggered, reason unknown".to_string());
            warn!(reason = %reason, "completion withheld by content filter");
            return Err(NsxbotError::ContentFiltered { reason });
        }

        let usage = response.tokens_usage.unwrap_or_default();
        debug!(
            model = %self.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            function_call = response.function_call.is_some(),
            "completion received"
        );
        Ok(CompletionResponse {
            text: response.text,
            function_call: response.function_call,
            usage,
            finish_reason: response.finish_reason,
        })
    }
}
