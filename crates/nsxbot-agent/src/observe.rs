// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a search action into an observation: FAQ first, then search.

use std::sync::Arc;

use nsxbot_core::types::{SearchRequest, SearchStrategy};
use nsxbot_core::{NsxbotError, SearchAdapter};
use strum::Display;
use tracing::{debug, warn};

use crate::faq::{FaqTool, UsedQuestions};
use crate::prompts::{ANSWER_NOT_FOUND, UNANSWERABLE_SEARCH};

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ObservationSource {
    Faq,
    Search,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub text: String,
    pub source: ObservationSource,
}

impl Observation {
    fn not_found(searches_left: usize) -> Self {
        let text = if searches_left == 0 {
            UNANSWERABLE_SEARCH
        } else {
            ANSWER_NOT_FOUND
        };
        Self {
            text: text.to_string(),
            source: ObservationSource::NotFound,
        }
    }
}

pub struct Observer {
    search: Arc<dyn SearchAdapter>,
    faq: Option<Arc<FaqTool>>,
    strategy: SearchStrategy,
    num_docs: usize,
}

impl Observer {
    pub fn new(
        search: Arc<dyn SearchAdapter>,
        faq: Option<Arc<FaqTool>>,
        strategy: SearchStrategy,
        num_docs: usize,
    ) -> Self {
        Self {
            search,
            faq,
            strategy,
            num_docs,
        }
    }

    /// Observation for `query` on `index`.
    ///
    /// Search failures and empty results become a "not found" observation;
    /// only LLM errors from the FAQ selection propagate.
    pub async fn observe(
        &self,
        index: &str,
        query: &str,
        used: &UsedQuestions,
        searches_left: usize,
    ) -> Result<Observation, NsxbotError> {
        if let Some(faq) = &self.faq
            && let Some(answer) = faq.lookup(index, query, used).await?
        {
            return Ok(Observation {
                text: answer,
                source: ObservationSource::Faq,
            });
        }

        let request = SearchRequest {
            index: index.to_string(),
            query: query.to_string(),
            strategy: self.strategy,
            max_docs: self.num_docs,
        };
        let passages = match self.search.search(&request).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(index, query, error = %e, code = e.code(), "search failed, observing no results");
                return Ok(Observation::not_found(searches_left));
            }
        };
        if passages.is_empty() {
            debug!(index, query, "search returned no passages");
            return Ok(Observation::not_found(searches_left));
        }
        let text = passages
            .iter()
            .take(self.num_docs)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Observation {
            text,
            source: ObservationSource::Search,
        })
    }
}
