// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the nsxbot agent.

use thiserror::Error;

/// The primary error type used across all nsxbot adapters and core operations.
#[derive(Debug, Error)]
pub enum NsxbotError {
    /// Configuration errors (invalid TOML, missing index, unknown strategy).
    #[error("configuration error: {0}")]
    Config(String),

    /// Memory store or audit log failures.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging gateway errors (360dialog rejected the payload, missing channel key).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Prompt answerer errors (HTTP failure, unexpected body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// NSX search, Sense or FAQ scoring failures.
    #[error("search error: {message}")]
    Search {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The NSX backend rejected the API key.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The completion was withheld by the provider content filter.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// The moderation service could not classify a message.
    #[error("moderation error: {0}")]
    Moderation(String),

    /// Model output could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// A prompt or history exceeded its token budget.
    #[error("token budget exceeded: {used} > {limit}")]
    TokenBudget { used: usize, limit: usize },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NsxbotError {
    /// Stable short code shown to users in the generic error reply and
    /// attached to every error log line.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "DIALOG_CONFIG",
            Self::Storage { .. } => "MEMORY",
            Self::Channel { .. } => "WEBHOOK",
            Self::Provider { .. } => "PROMPT_ANSWERER",
            Self::Search { .. } => "NSX_SEARCH",
            Self::Authentication(_) => "NSX_AUTHENTICATION",
            Self::ContentFiltered { .. } => "CONTENT_FILTER",
            Self::Moderation(_) => "MODERATION",
            Self::Parse(_) => "PARSE",
            Self::TokenBudget { .. } => "MAX_TOKENS",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Shorthand for a storage error built from any displayable failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage {
            source: err.to_string().into(),
        }
    }

    /// Shorthand for a search error without an underlying source.
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_variant() {
        let errors = [
            NsxbotError::Config("x".into()),
            NsxbotError::storage("x"),
            NsxbotError::Channel {
                message: "x".into(),
                source: None,
            },
            NsxbotError::provider("x"),
            NsxbotError::search("x"),
            NsxbotError::Authentication("x".into()),
            NsxbotError::ContentFiltered { reason: "x".into() },
            NsxbotError::Moderation("x".into()),
            NsxbotError::Parse("x".into()),
            NsxbotError::TokenBudget { used: 2, limit: 1 },
            NsxbotError::Timeout {
                duration: std::time::Duration::from_secs(1),
            },
            NsxbotError::Internal("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(NsxbotError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn display_includes_message() {
        let err = NsxbotError::search("index not found");
        assert_eq!(err.to_string(), "search error: index not found");
        let err = NsxbotError::TokenBudget {
            used: 4100,
            limit: 4000,
        };
        assert_eq!(err.to_string(), "token budget exceeded: 4100 > 4000");
    }
}
