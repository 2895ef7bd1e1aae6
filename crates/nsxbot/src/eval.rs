// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nsxbot eval` command implementation.

use std::sync::Arc;

use nsxbot_config::NsxbotConfig;
use nsxbot_core::NsxbotError;
use nsxbot_eval::{EvalSettings, Grader, run_evaluation, summary_table};
use nsxbot_llm::PromptAnswererProvider;

use crate::wiring::build_handler;

pub async fn run_eval(mut config: NsxbotConfig) -> Result<(), NsxbotError> {
    let settings = EvalSettings::load()
        .map_err(|e| NsxbotError::Config(format!("invalid NSXBOT_EVAL_* settings: {e}")))?;
    settings.apply_to(&mut config);

    println!("Evaluation settings:");
    println!("  pipeline:   {}", settings.pipeline_name);
    println!("  model:      {}", settings.model);
    println!("  evaluator:  {}", settings.evaluator_model);
    println!("  features:   {}", settings.activated_features());
    println!("  datasets:   {}", settings.dataset_dir().display());

    let config = Arc::new(config);
    let storage = nsxbot_storage::open_storage(&config.memory).await?;
    let handler = Arc::new(build_handler(config.clone(), &storage)?);
    let grader = Grader::new(Arc::new(PromptAnswererProvider::with_model(
        &config.llm,
        settings.evaluator_model.clone(),
    )?));

    let report = run_evaluation(&settings, handler, grader).await?;

    println!("\nEvaluation {} ({})", report.eval_id, report.metadata);
    println!("{}", summary_table(&report.evaluations));
    println!("log:         {}", report.log_path.display());
    println!("results:     {}", report.results_path.display());
    println!("evaluations: {}", report.evaluations_path.display());
    Ok(())
}
