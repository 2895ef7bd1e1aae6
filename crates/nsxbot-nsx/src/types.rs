// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the NSX search, MultidocQA and score endpoints.

use serde::{Deserialize, Serialize};

/// Body of `GET /api/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    /// Neural reranker ranking.
    #[serde(default)]
    pub response_reranker: Vec<NsxDocument>,
    /// BM25 ranking, present when `return_reference=1`.
    #[serde(default)]
    pub response_reference: Vec<NsxDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NsxDocument {
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl NsxDocument {
    pub fn first_paragraph(&self) -> Option<&str> {
        self.paragraphs
            .first()
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SenseRequest<'a> {
    pub query: &'a str,
    pub documents: Vec<SenseDocument>,
    pub language: &'a str,
    pub index: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SenseDocument {
    pub paragraphs: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenseResponse {
    pub pred_answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreRequest<'a> {
    pub query: &'a str,
    pub documents: &'a [String],
    pub language: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    pub results: Vec<ScoreResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResult {
    pub score: f32,
}

/// Error payloads: the search API uses `message`, MultidocQA uses `detail`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message.or_else(|| {
            self.detail.map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
        })
    }
}
