// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the prompt answerer and moderation services.

use nsxbot_core::types::{ChatMessage, FunctionCall, FunctionSchema, TokenUsage};
use serde::{Deserialize, Serialize};

/// Body of a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct AnswererRequest {
    pub service: String,
    pub prompt: Vec<ChatMessage>,
    pub model: String,
    pub configurations: Configurations,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSchema>,
}

/// Sampling settings. Reasoning is always greedy.
#[derive(Debug, Clone, Serialize)]
pub struct Configurations {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub stop: Vec<String>,
}

impl Configurations {
    pub fn greedy(max_tokens: u32, stop: Vec<String>) -> Self {
        Self {
            temperature: 0.0,
            max_tokens,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswererResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub tokens_usage: Option<TokenUsage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub content_filter_results: Option<ContentFilterResults>,
}

/// Per-category filter verdicts, keyed by category name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilterResults {
    #[serde(default)]
    pub prompt: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub completion: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ContentFilterResults {
    /// Human-readable reason naming the first filtered category.
    pub fn reason(&self) -> Option<String> {
        if let Some((category, severity)) = self.prompt.as_ref().and_then(first_filtered) {
            return Some(format!(
                "the prompt was filtered for {category} content with severity {severity}"
            ));
        }
        self.completion
            .as_ref()
            .and_then(first_filtered)
            .map(|(category, severity)| {
                format!("the completion was filtered for {category} content with severity {severity}")
            })
    }
}

fn first_filtered(results: &serde_json::Map<String, serde_json::Value>) -> Option<(String, String)> {
    results.iter().find_map(|(category, verdict)| {
        let filtered = verdict.get("filtered")?.as_bool()?;
        filtered.then(|| {
            let severity = verdict
                .get("severity")
                .and_then(|s| s.as_str())
                .unwrap_or("unknown");
            (category.clone(), severity.to_string())
        })
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRequest<'a> {
    pub service: &'a str,
    pub input: [&'a str; 1],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResponse {
    pub results: Vec<ModerationResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModerationResult {
    pub flagged: bool,
}
