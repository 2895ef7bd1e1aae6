// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nsxbot.toml` > `~/.config/nsxbot/nsxbot.toml` > `/etc/nsxbot/nsxbot.toml`
//! with environment variable overrides via `NSXBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NsxbotConfig;

/// Sections addressable from the environment, e.g. `NSXBOT_NSX_API_KEY`.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "reasoning",
    "features",
    "llm",
    "nsx",
    "faq",
    "memory",
    "gateway",
    "secrets",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nsxbot/nsxbot.toml` (system-wide)
/// 3. `~/.config/nsxbot/nsxbot.toml` (user XDG config)
/// 4. `./nsxbot.toml` (local directory)
/// 5. `NSXBOT_*` environment variables
pub fn load_config() -> Result<NsxbotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<NsxbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NsxbotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NsxbotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NsxbotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(NsxbotConfig::default()))
        .merge(Toml::file("/etc/nsxbot/nsxbot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("nsxbot/nsxbot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("nsxbot.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `NSXBOT_MEMORY_MAX_TOKENS_HISTORY` maps to `memory.max_tokens_history`.
/// Variables outside the known sections (e.g. `NSXBOT_EVAL_*`) are ignored.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("NSXBOT_")
        .filter(|key| map_env_key(key.as_str()).is_some())
        .map(|key| {
            map_env_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}

/// Maps a lowercased, prefix-stripped variable name to its dotted key.
pub(crate) fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| format!("{section}.{rest}"))
    })
}
