// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stand-ins for NSX search, the FAQ scorer and the moderation service.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use nsxbot_core::traits::adapter::PluginAdapter;
use nsxbot_core::types::{AdapterType, HealthStatus, Passage, SearchRequest};
use nsxbot_core::{FaqScorer, ModerationAdapter, NsxbotError, SearchAdapter};

/// Scripted search backend.
///
/// Queries with a scripted result get it; every other query gets the
/// default passages (none unless set).
pub struct MockSearch {
    by_query: Arc<Mutex<HashMap<String, Vec<Passage>>>>,
    default: Vec<Passage>,
    failing: bool,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::with_default(Vec::<String>::new())
    }

    /// Returns these passages for any query.
    pub fn with_default<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            by_query: Arc::new(Mutex::new(HashMap::new())),
            default: texts.into_iter().map(Passage::new).collect(),
            failing: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every search fails with an `NSX_SEARCH` error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub async fn answer<I, S>(&self, query: &str, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_query.lock().await.insert(
            query.to_string(),
            texts.into_iter().map(Passage::new).collect(),
        );
    }

    pub async fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockSearch {
    fn name(&self) -> &str {
        "mock-search"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SearchAdapter for MockSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Passage>, NsxbotError> {
        self.requests.lock().await.push(request.clone());
        if self.failing {
            return Err(NsxbotError::search("mock search unavailable"));
        }
        let scripted = self.by_query.lock().await.get(&request.query).cloned();
        Ok(scripted.unwrap_or_else(|| self.default.clone()))
    }
}

/// Scorer returning a fixed score per question, 0.0 for the rest.
pub struct MockFaqScorer {
    scores: HashMap<String, f32>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockFaqScorer {
    pub fn new() -> Self {
        Self::with_scores(Vec::<(String, f32)>::new())
    }

    pub fn with_scores<I, S>(scores: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self {
            scores: scores.into_iter().map(|(q, s)| (q.into(), s)).collect(),
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for MockFaqScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockFaqScorer {
    fn name(&self) -> &str {
        "mock-faq-scorer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FaqScorer
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FaqScorer for MockFaqScorer {
    async fn score(&self, _query: &str, questions: &[String]) -> Result<Vec<f32>, NsxbotError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(NsxbotError::search("mock scorer unavailable"));
        }
        Ok(questions
            .iter()
            .map(|q| self.scores.get(q).copied().unwrap_or(0.0))
            .collect())
    }
}

/// Flags any text containing one of its blocked words.
pub struct MockModeration {
    blocked: Vec<String>,
    failing: bool,
    checked: Arc<Mutex<Vec<String>>>,
}

impl MockModeration {
    pub fn blocking<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocked: words.into_iter().map(Into::into).collect(),
            failing: false,
            checked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every check fails with a `MODERATION` error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::blocking(Vec::<String>::new())
        }
    }

    /// Texts submitted for moderation, oldest first.
    pub async fn checked(&self) -> Vec<String> {
        self.checked.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockModeration {
    fn name(&self) -> &str {
        "mock-moderation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Moderation
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ModerationAdapter for MockModeration {
    async fn is_flagged(&self, text: &str) -> Result<bool, NsxbotError> {
        self.checked.lock().await.push(text.to_string());
        if self.failing {
            return Err(NsxbotError::Moderation("mock moderation unavailable".into()));
        }
        Ok(self.blocked.iter().any(|w| text.contains(w.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxbot_core::types::SearchStrategy;

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            index: "FUNDEP_Ciencias".into(),
            query: query.into(),
            strategy: SearchStrategy::Neural,
            max_docs: 3,
        }
    }

    #[tokio::test]
    async fn scripted_query_wins_over_default() {
        let search = MockSearch::with_default(["padrão"]);
        search.answer("prazo", ["até 30 de junho"]).await;

        let hit = search.search(&request("prazo")).await.unwrap();
        assert_eq!(hit[0].text, "até 30 de junho");
        let other = search.search(&request("outra")).await.unwrap();
        assert_eq!(other[0].text, "padrão");
        assert_eq!(search.queries().await, ["prazo", "outra"]);
    }

    #[tokio::test]
    async fn scorer_keeps_question_order() {
        let scorer = MockFaqScorer::with_scores([("b", 0.9)]);
        let scores = scorer
            .score("q", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, [0.0, 0.9]);
        assert_eq!(scorer.calls(), 1);
    }

    #[tokio::test]
    async fn moderation_flags_blocked_words() {
        let moderation = MockModeration::blocking(["ofensa"]);
        assert!(moderation.is_flagged("uma ofensa").await.unwrap());
        assert!(!moderation.is_flagged("bom dia").await.unwrap());
        assert!(MockModeration::failing().is_flagged("x").await.is_err());
    }
}
