// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FAQ book and the two ways the agent consults it.
//!
//! - [`FaqTool::short_circuit`] answers a whole message from the book when
//!   the scorer is confident enough, without any LLM call.
//! - [`FaqTool::lookup`] serves a search action: the scorer shortlists
//!   questions and the LLM picks the one equivalent to the search, if any.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use nsxbot_config::model::FaqConfig;
use nsxbot_core::types::CompletionRequest;
use nsxbot_core::{CompletionAdapter, FaqScorer, NsxbotError, count_tokens};
use tracing::{debug, info, warn};

use crate::prompts;

/// Question-to-answer maps, one per search index.
#[derive(Debug, Clone, Default)]
pub struct FaqBook {
    sets: HashMap<String, BTreeMap<String, String>>,
}

impl FaqBook {
    /// Loads every `<index>.json` file in `dir`. A missing directory yields
    /// an empty book.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, NsxbotError> {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "FAQ directory not found, FAQ disabled");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(NsxbotError::Config(format!(
                    "cannot read FAQ directory {}: {e}",
                    dir.display()
                )));
            }
        };

        let mut book = Self::default();
        for entry in entries {
            let path = entry
                .map_err(|e| NsxbotError::Config(format!("cannot read FAQ entry: {e}")))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(index) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path).map_err(|e| {
                NsxbotError::Config(format!("cannot read FAQ file {}: {e}", path.display()))
            })?;
            let set: BTreeMap<String, String> = serde_json::from_str(&content).map_err(|e| {
                NsxbotError::Config(format!("invalid FAQ file {}: {e}", path.display()))
            })?;
            debug!(index, questions = set.len(), "loaded FAQ");
            book.sets.insert(index.to_string(), set);
        }
        Ok(book)
    }

    pub fn insert(&mut self, index: impl Into<String>, set: BTreeMap<String, String>) {
        self.sets.insert(index.into(), set);
    }

    pub fn questions(&self, index: &str) -> Option<&BTreeMap<String, String>> {
        self.sets.get(index).filter(|set| !set.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.sets.values().all(BTreeMap::is_empty)
    }
}

/// FAQ questions already used while answering the current message.
#[derive(Debug, Default)]
pub struct UsedQuestions(Mutex<Vec<String>>);

impl UsedQuestions {
    pub fn contains(&self, question: &str) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|q| q == question)
    }

    pub fn insert(&self, question: &str) {
        let mut used = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !used.iter().any(|q| q == question) {
            used.push(question.to_string());
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// A confident FAQ match for a whole message.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqHit {
    pub question: String,
    pub answer: String,
    pub score: f32,
}

pub struct FaqTool {
    book: Arc<FaqBook>,
    scorer: Arc<dyn FaqScorer>,
    llm: Arc<dyn CompletionAdapter>,
    max_questions: usize,
    max_tokens_prompt: usize,
    threshold: f32,
}

impl FaqTool {
    pub fn new(
        book: Arc<FaqBook>,
        scorer: Arc<dyn FaqScorer>,
        llm: Arc<dyn CompletionAdapter>,
        config: &FaqConfig,
    ) -> Self {
        Self {
            book,
            scorer,
            llm,
            max_questions: config.max_questions,
            max_tokens_prompt: config.max_tokens_prompt,
            threshold: config.confidence_threshold,
        }
    }

    /// Questions of `index` ordered by descending score against `query`.
    async fn ranked(&self, index: &str, query: &str) -> Result<Vec<(String, f32)>, NsxbotError> {
        let Some(set) = self.book.questions(index) else {
            return Ok(Vec::new());
        };
        let questions: Vec<String> = set.keys().cloned().collect();
        let scores = self.scorer.score(query, &questions).await?;
        let mut ranked: Vec<(String, f32)> = questions.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    /// Best-scoring entry when its score reaches the confidence threshold.
    ///
    /// Scoring failures are logged and treated as no match.
    pub async fn short_circuit(&self, index: &str, message: &str) -> Option<FaqHit> {
        let set = self.book.questions(index)?;
        let ranked = match self.ranked(index, message).await {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!(index, error = %e, code = e.code(), "FAQ scoring failed");
                return None;
            }
        };
        let (question, score) = ranked.into_iter().next()?;
        if score < self.threshold {
            debug!(index, score, "best FAQ match below threshold");
            return None;
        }
        let answer = set.get(&question)?.clone();
        info!(index, score, question = %question, "FAQ short-circuit");
        Some(FaqHit {
            question,
            answer,
            score,
        })
    }

    /// Answer for a search query from the FAQ, skipping questions in `used`.
    ///
    /// `Ok(None)` when the index has no FAQ, scoring fails or the model
    /// finds no equivalent question. LLM errors propagate.
    pub async fn lookup(
        &self,
        index: &str,
        query: &str,
        used: &UsedQuestions,
    ) -> Result<Option<String>, NsxbotError> {
        let Some(set) = self.book.questions(index) else {
            return Ok(None);
        };
        let top: Vec<String> = match self.ranked(index, query).await {
            Ok(ranked) => ranked
                .into_iter()
                .take(self.max_questions)
                .map(|(q, _)| q)
                .collect(),
            Err(e) => {
                warn!(index, error = %e, code = e.code(), "FAQ scoring failed");
                return Ok(None);
            }
        };

        let mut queries = String::new();
        let mut prompt_size = count_tokens(&prompts::faq_prompt("", query));
        for question in &top {
            let size = count_tokens(question);
            if !used.contains(question) && prompt_size + size < self.max_tokens_prompt {
                queries.push_str(question);
                queries.push('\n');
                prompt_size += size;
            }
        }
        if queries.is_empty() {
            return Ok(None);
        }

        let request =
            CompletionRequest::prompt(prompts::faq_prompt(&queries, query)).with_stop(["\n"]);
        let selected = self.llm.complete(request).await?.text_or_empty();

        let matched = if set.contains_key(&selected) {
            Some(selected.clone())
        } else {
            top.into_iter().find(|q| selected.contains(q.as_str()))
        };
        Ok(matched.and_then(|question| {
            debug!(index, question = %question, "FAQ lookup matched");
            used.insert(&question);
            set.get(&question).cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reads_one_set_per_json_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("FUNDEP_Ciencias.json"),
            r#"{"Qual a data da prova?": "25/03/2024"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let book = FaqBook::load(dir.path()).unwrap();
        let set = book.questions("FUNDEP_Ciencias").unwrap();
        assert_eq!(set["Qual a data da prova?"], "25/03/2024");
        assert!(book.questions("notes").is_none());
    }

    #[test]
    fn missing_directory_is_an_empty_book() {
        let book = FaqBook::load("/nonexistent/nsxbot/faqs").unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.json"), "[1, 2]").unwrap();
        let err = FaqBook::load(dir.path()).unwrap_err();
        assert_eq!(err.code(), "DIALOG_CONFIG");
    }

    #[test]
    fn used_questions_are_deduplicated() {
        let used = UsedQuestions::default();
        used.insert("a");
        used.insert("a");
        assert!(used.contains("a"));
        assert_eq!(used.to_vec(), vec!["a".to_string()]);
    }
}
