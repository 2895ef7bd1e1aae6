// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval adapters: passage search and FAQ question scoring.

use async_trait::async_trait;

use crate::error::NsxbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Passage, SearchRequest};

/// Adapter for a passage search backend.
///
/// Implementations return at most `request.max_docs` passages, best first.
/// An empty vector means the backend found nothing; errors are reserved for
/// transport, authentication and backend failures.
#[async_trait]
pub trait SearchAdapter: PluginAdapter {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Passage>, NsxbotError>;
}

/// Adapter that scores how well each candidate question matches a query.
#[async_trait]
pub trait FaqScorer: PluginAdapter {
    /// Returns one score per entry of `questions`, in the same order.
    async fn score(
        &self,
        query: &str,
        questions: &[String],
    ) -> Result<Vec<f32>, NsxbotError>;
}
