// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation run settings.
//!
//! Compiled defaults overridden by `NSXBOT_EVAL_*` environment variables,
//! e.g. `NSXBOT_EVAL_PIPELINE_NAME=nightly NSXBOT_EVAL_FAQ=true`. Lists use
//! figment's inline syntax: `NSXBOT_EVAL_EVALUATION_INDEXES=[A,B]`,
//! `NSXBOT_EVAL_INDEX_MAPPING={old=new}`.

#![allow(clippy::result_large_err)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Serialized};
use nsxbot_config::NsxbotConfig;
use nsxbot_config::model::MemoryBackend;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalSettings {
    /// Groups reports under `<log_dir>/<pipeline_name>`.
    pub pipeline_name: String,
    /// Model the chatbot answers with.
    pub model: String,
    /// Model that grades the answers.
    pub evaluator_model: String,
    pub memory: bool,
    pub faq: bool,
    pub sense: bool,
    pub bm25_only: bool,
    /// Questions taken per dataset, `-1` for all.
    pub max_dataset_questions: i64,
    /// Variants taken per question, `-1` for all.
    pub max_variant_questions: i64,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Dataset JSON files; `<data_dir>/<pipeline_name>/datasets` when unset.
    pub dataset_dir: Option<PathBuf>,
    /// Questions answered at the same time.
    pub concurrency: usize,
    /// Only datasets for these indexes run; empty runs all.
    pub evaluation_indexes: Vec<String>,
    /// Renames dataset indexes before running, e.g. to a reindexed copy.
    pub index_mapping: BTreeMap<String, String>,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            pipeline_name: "default".into(),
            model: "gpt-3.5-turbo-azure".into(),
            evaluator_model: "gpt-4".into(),
            memory: false,
            faq: false,
            sense: false,
            bm25_only: false,
            max_dataset_questions: -1,
            max_variant_questions: -1,
            data_dir: "validation/data".into(),
            log_dir: "validation/logs".into(),
            dataset_dir: None,
            concurrency: 4,
            evaluation_indexes: Vec::new(),
            index_mapping: BTreeMap::new(),
        }
    }
}

impl EvalSettings {
    /// Defaults overlaid with the process environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("NSXBOT_EVAL_"))
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.dataset_dir
            .clone()
            .unwrap_or_else(|| self.pipeline_data_dir().join("datasets"))
    }

    pub fn pipeline_data_dir(&self) -> PathBuf {
        self.data_dir.join(&self.pipeline_name)
    }

    pub fn pipeline_log_dir(&self) -> PathBuf {
        self.log_dir.join(&self.pipeline_name)
    }

    /// `-1` (or any negative value) means no limit.
    pub fn question_limit(&self) -> Option<usize> {
        usize::try_from(self.max_dataset_questions).ok()
    }

    pub fn variant_limit(&self) -> Option<usize> {
        usize::try_from(self.max_variant_questions).ok()
    }

    /// Chatbot configuration for the run: the toggles above, an in-memory
    /// store and the reasoning trace in every reply.
    pub fn apply_to(&self, config: &mut NsxbotConfig) {
        config.features.memory = self.memory;
        config.features.faq = self.faq;
        config.features.sense = self.sense;
        config.features.bm25_only = self.bm25_only;
        config.memory.backend = MemoryBackend::Memory;
        config.agent.return_debug = true;
        config.llm.model = self.model.clone();
    }

    /// Comma-joined list of what the run exercises, ending in the search
    /// backend (`sense` or `nsx`).
    pub fn activated_features(&self) -> String {
        let mut features = String::new();
        if self.memory {
            features.push_str("memory,");
        }
        if self.faq {
            features.push_str("faq,");
        }
        if self.bm25_only {
            features.push_str("bm25-only,");
        }
        features.push_str(if self.sense { "sense" } else { "nsx" });
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NSXBOT_EVAL_PIPELINE_NAME", "nightly");
            jail.set_env("NSXBOT_EVAL_FAQ", "true");
            jail.set_env("NSXBOT_EVAL_MAX_DATASET_QUESTIONS", "10");
            jail.set_env("NSXBOT_EVAL_EVALUATION_INDEXES", "[FUNDEP_Ciencias]");
            let settings = EvalSettings::load()?;
            assert_eq!(settings.pipeline_name, "nightly");
            assert!(settings.faq);
            assert_eq!(settings.question_limit(), Some(10));
            assert_eq!(settings.variant_limit(), None);
            assert_eq!(settings.evaluation_indexes, ["FUNDEP_Ciencias"]);
            Ok(())
        });
    }

    #[test]
    fn dataset_dir_defaults_under_pipeline() {
        let settings = EvalSettings {
            pipeline_name: "p".into(),
            ..EvalSettings::default()
        };
        assert_eq!(settings.dataset_dir(), PathBuf::from("validation/data/p/datasets"));
    }

    #[test]
    fn activated_features_end_with_backend() {
        let mut settings = EvalSettings::default();
        assert_eq!(settings.activated_features(), "nsx");
        settings.memory = true;
        settings.bm25_only = true;
        settings.sense = true;
        assert_eq!(settings.activated_features(), "memory,bm25-only,sense");
    }

    #[test]
    fn apply_forces_debug_and_memory_backend() {
        let mut config = NsxbotConfig::default();
        let settings = EvalSettings {
            faq: true,
            ..EvalSettings::default()
        };
        settings.apply_to(&mut config);
        assert!(config.agent.return_debug);
        assert!(config.features.faq);
        assert!(!config.features.memory);
        assert_eq!(config.memory.backend, MemoryBackend::Memory);
    }
}
