// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: endpoint URLs, loop bounds,
//! thresholds, WhatsApp menu limits and index uniqueness.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::NsxbotConfig;

/// WhatsApp rejects list-menu buttons longer than this.
pub const MAX_MENU_BUTTON_CHARS: usize = 20;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &NsxbotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    for (key, url) in [
        ("llm.completion_endpoint", &config.llm.completion_endpoint),
        ("llm.moderation_endpoint", &config.llm.moderation_endpoint),
        ("nsx.search_endpoint", &config.nsx.search_endpoint),
        ("nsx.score_endpoint", &config.nsx.score_endpoint),
        ("nsx.sense_endpoint", &config.nsx.sense_endpoint),
        ("gateway.text_url", &config.gateway.text_url),
    ] {
        let url = url.trim();
        if url.is_empty() {
            errors.push(ConfigError::invalid(key, "must not be empty"));
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::invalid(
                key,
                format!("`{url}` must be an http(s) URL"),
            ));
        }
    }

    if config.reasoning.max_steps == 0 {
        errors.push(ConfigError::invalid(
            "reasoning.max_steps",
            "must be at least 1",
        ));
    }
    if config.reasoning.num_docs == 0 {
        errors.push(ConfigError::invalid("reasoning.num_docs", "must be at least 1"));
    }
    if config.reasoning.parallel_observations == 0 {
        errors.push(ConfigError::invalid(
            "reasoning.parallel_observations",
            "must be at least 1",
        ));
    }
    if config.reasoning.max_tokens_function_call as usize >= config.reasoning.max_tokens_prompt {
        errors.push(ConfigError::invalid(
            "reasoning.max_tokens_function_call",
            format!(
                "must be smaller than reasoning.max_tokens_prompt ({})",
                config.reasoning.max_tokens_prompt
            ),
        ));
    }

    if config.nsx.max_docs_to_return == 0 {
        errors.push(ConfigError::invalid(
            "nsx.max_docs_to_return",
            "must be at least 1",
        ));
    }

    let threshold = config.faq.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        errors.push(ConfigError::invalid(
            "faq.confidence_threshold",
            format!("must be between 0 and 1, got {threshold}"),
        ));
    }
    if config.faq.max_questions == 0 {
        errors.push(ConfigError::invalid("faq.max_questions", "must be at least 1"));
    }

    if config.memory.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "memory.database_path",
            "must not be empty",
        ));
    }
    if config.memory.expiration_secs == 0 {
        errors.push(ConfigError::invalid(
            "memory.expiration_secs",
            "must be at least 1",
        ));
    }

    if !config.gateway.menu_command.starts_with('#') {
        errors.push(ConfigError::invalid(
            "gateway.menu_command",
            format!("`{}` must start with `#`", config.gateway.menu_command),
        ));
    }
    let button_len = config.gateway.menu_button.chars().count();
    if button_len > MAX_MENU_BUTTON_CHARS {
        errors.push(ConfigError::invalid(
            "gateway.menu_button",
            format!("must be at most {MAX_MENU_BUTTON_CHARS} characters, got {button_len}"),
        ));
    }
    if config.gateway.max_message_chars == 0 {
        errors.push(ConfigError::invalid(
            "gateway.max_message_chars",
            "must be at least 1",
        ));
    }

    let mut seen = HashSet::new();
    for (i, index) in config.indexes.iter().enumerate() {
        if index.id.trim().is_empty() {
            errors.push(ConfigError::invalid(
                format!("indexes[{i}].id"),
                "must not be empty",
            ));
        } else if !seen.insert(index.id.as_str()) {
            errors.push(ConfigError::invalid(
                format!("indexes[{i}].id"),
                format!("duplicate index `{}`", index.id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
