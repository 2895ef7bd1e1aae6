// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion service for deterministic testing.
//!
//! `MockCompletion` pops scripted responses from a FIFO queue and records
//! every request it receives, so tests can assert on prompts and stop
//! sequences.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use nsxbot_core::traits::adapter::PluginAdapter;
use nsxbot_core::types::{
    AdapterType, CompletionRequest, CompletionResponse, HealthStatus, TokenUsage,
};
use nsxbot_core::{CompletionAdapter, NsxbotError};

/// A mock completion service.
///
/// An exhausted queue answers with a provider error, which makes an
/// unexpected extra LLM call visible in the test outcome.
pub struct MockCompletion {
    responses: Arc<Mutex<VecDeque<Result<CompletionResponse, NsxbotError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock pre-loaded with text completions.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue = texts
            .into_iter()
            .map(|t| Ok(text_response(t.into())))
            .collect();
        Self {
            responses: Arc::new(Mutex::new(queue)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Ok(text_response(text.into())));
    }

    /// Queue a function call with JSON `arguments`.
    pub async fn push_call(&self, name: &str, arguments: &str) {
        let mut response = CompletionResponse::from_call(name, arguments);
        response.usage = usage();
        self.responses.lock().await.push_back(Ok(response));
    }

    pub async fn push_error(&self, error: NsxbotError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Responses still queued.
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

fn usage() -> TokenUsage {
    TokenUsage {
        prompt_tokens: 10,
        completion_tokens: 20,
        total_tokens: 30,
    }
}

fn text_response(text: String) -> CompletionResponse {
    let mut response = CompletionResponse::from_text(text);
    response.usage = usage();
    response.finish_reason = Some("stop".to_string());
    response
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
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
impl CompletionAdapter for MockCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, NsxbotError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(NsxbotError::provider("mock completion queue is empty")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_come_back_in_order() {
        let mock = MockCompletion::with_texts(["first", "second"]);
        let a = mock.complete(CompletionRequest::prompt("a")).await.unwrap();
        let b = mock.complete(CompletionRequest::prompt("b")).await.unwrap();
        assert_eq!(a.text.as_deref(), Some("first"));
        assert_eq!(b.text.as_deref(), Some("second"));
        assert_eq!(mock.call_count().await, 2);
    }

    #[tokio::test]
    async fn empty_queue_is_an_error() {
        let mock = MockCompletion::new();
        let err = mock
            .complete(CompletionRequest::prompt("x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PROMPT_ANSWERER");
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let mock = MockCompletion::new();
        mock.push_call("buscar", "{}").await;
        let request = CompletionRequest::prompt("olá").with_stop(["Mensagem:"]);
        let response = mock.complete(request.clone()).await.unwrap();
        assert!(response.function_call.is_some());
        assert_eq!(mock.requests().await, vec![request]);
        assert_eq!(mock.remaining().await, 0);
    }
}
