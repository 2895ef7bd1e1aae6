// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation harness.
//!
//! Replays dataset questions through a [`ChatHandler`], grades every answer
//! with an LLM and writes the run's reports:
//!
//! - `<log_dir>/<pipeline>/<eval_id>_log.json`: run configuration and answer log
//! - `<log_dir>/<pipeline>/<eval_id>_results.csv`: one row per question
//! - `<data_dir>/<pipeline>/<eval_id>_evaluations.jsonl`: accuracy per index

pub mod dataset;
pub mod grader;
pub mod metadata;
pub mod report;
pub mod runner;
pub mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use nsxbot_agent::ChatHandler;
use nsxbot_core::NsxbotError;
use tracing::info;

pub use dataset::{Dataset, DatasetQuestion, QuestionCase};
pub use grader::{Grade, Grader};
pub use report::{AnswerLog, EvaluationConfig, EvaluationLog, IndexEvaluation, summary_table};
pub use runner::{CaseResult, EvalRunner};
pub use settings::EvalSettings;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub eval_id: String,
    pub metadata: String,
    pub evaluations: Vec<IndexEvaluation>,
    pub log_path: PathBuf,
    pub results_path: PathBuf,
    pub evaluations_path: PathBuf,
}

/// Runs one evaluation. `handler` must be built from a configuration
/// passed through [`EvalSettings::apply_to`].
pub async fn run_evaluation(
    settings: &EvalSettings,
    handler: Arc<ChatHandler>,
    grader: Grader,
) -> Result<EvalReport, NsxbotError> {
    let eval_id = metadata::new_eval_id();
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let metadata = metadata::git_metadata(&settings.activated_features()).await;
    info!(
        pipeline = %settings.pipeline_name,
        %eval_id,
        %metadata,
        model = %settings.model,
        "starting evaluation"
    );

    let dataset_dir = settings.dataset_dir();
    let datasets = dataset::select(
        dataset::load_datasets(&dataset_dir).await?,
        &settings.evaluation_indexes,
        &settings.index_mapping,
    );
    let indexes: Vec<String> = datasets.iter().map(|d| d.index.clone()).collect();
    let cases = dataset::question_pool(
        &datasets,
        settings.question_limit(),
        settings.variant_limit(),
    );
    if cases.is_empty() {
        return Err(NsxbotError::Config(format!(
            "no questions to evaluate in {}",
            dataset_dir.display()
        )));
    }
    info!(datasets = datasets.len(), questions = cases.len(), "question pool ready");

    let runner = EvalRunner::new(handler, grader, settings.concurrency);
    let results = runner.run(cases).await;

    let version = env!("CARGO_PKG_VERSION").to_string();
    let answers: Vec<AnswerLog> = results
        .iter()
        .map(|r| AnswerLog {
            evaluation_id: eval_id.clone(),
            timestamp: timestamp.clone(),
            chatbot_version: version.clone(),
            evaluator: grader::EVALUATOR_NAME.to_string(),
            index: r.case.index.clone(),
            question: r.case.question.clone(),
            expected_answer: r.case.gold_answer.clone(),
            answer: r.answer.clone(),
            evaluation: r.evaluation.clone(),
            reasoning: r.reasoning.clone(),
            answered: r.answered,
            evaluated: r.evaluated,
            latency: r.latency,
            eval_prompt_tokens: r.eval_usage.prompt_tokens,
            eval_completion_tokens: r.eval_usage.completion_tokens,
            metadata: metadata.clone(),
        })
        .collect();
    let log = EvaluationLog {
        eval_config: EvaluationConfig {
            id: eval_id.clone(),
            pipeline: settings.pipeline_name.clone(),
            model: settings.model.clone(),
            memory: settings.memory,
            faq: settings.faq,
            sense: settings.sense,
            bm25_only: settings.bm25_only,
            number_of_questions: results.len(),
            timestamp,
            chatbot_version: version,
            evaluator: grader::EVALUATOR_NAME.to_string(),
            metadata: metadata.clone(),
        },
        log: answers,
    };

    let log_dir = settings.pipeline_log_dir();
    let data_dir = settings.pipeline_data_dir();
    for dir in [&log_dir, &data_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(NsxbotError::storage)?;
    }
    let log_path = log_dir.join(format!("{eval_id}_log.json"));
    let results_path = log_dir.join(format!("{eval_id}_results.csv"));
    let evaluations_path = data_dir.join(format!("{eval_id}_evaluations.jsonl"));

    let evaluations = report::index_evaluations(&indexes, &results);
    report::write_log(&log_path, &log)?;
    report::write_results_csv(&results_path, &log.log)?;
    report::write_evaluations_jsonl(&evaluations_path, &evaluations)?;
    info!(%eval_id, log = %log_path.display(), "evaluation finished");

    Ok(EvalReport {
        eval_id,
        metadata,
        evaluations,
        log_path,
        results_path,
        evaluations_path,
    })
}
