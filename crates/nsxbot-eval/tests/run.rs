// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full evaluation runs against mock adapters.

use std::sync::Arc;

use nsxbot_eval::{EvalSettings, EvaluationLog, Grader, run_evaluation};
use nsxbot_test_utils::{MockCompletion, TestHarness};
use serde_json::json;

fn settings(root: &std::path::Path) -> EvalSettings {
    EvalSettings {
        pipeline_name: "ci".into(),
        data_dir: root.join("data"),
        log_dir: root.join("logs"),
        dataset_dir: Some(root.join("datasets")),
        concurrency: 1,
        ..EvalSettings::default()
    }
}

fn write_dataset(root: &std::path::Path) {
    std::fs::create_dir_all(root.join("datasets")).unwrap();
    let dataset = json!({
        "index": "FUNDEP_Ciencias",
        "questions": [
            {"id": "q1", "answer": "25 de março", "variants": ["Quando é a prova?"]},
            {"id": "q2", "answer": "R$ 150", "variants": ["Quanto custa a inscrição?"]}
        ]
    });
    std::fs::write(root.join("datasets/ciencias.json"), dataset.to_string()).unwrap();
}

#[tokio::test]
async fn run_writes_all_reports() {
    let root = tempfile::TempDir::new().unwrap();
    write_dataset(root.path());
    let settings = settings(root.path());

    let harness = TestHarness::builder()
        .with_config(|c| settings.apply_to(c))
        .with_completions([
            " Sei a data.\nAção 1: Finalizar[A prova é dia 25/03.]",
            " Sei o valor.\nAção 1: Finalizar[A inscrição custa R$ 200.]",
        ])
        .build()
        .await
        .unwrap();
    let grader_llm = Arc::new(MockCompletion::with_texts([
        "Avaliação: correct",
        "Avaliação: incorrect",
    ]));

    let report = run_evaluation(&settings, harness.handler.clone(), Grader::new(grader_llm))
        .await
        .unwrap();

    assert!(report.eval_id.starts_with("evl-"));
    assert!(report.metadata.starts_with("ACTIVATED:nsx_BRANCH:"));
    assert_eq!(report.evaluations.len(), 1);
    assert_eq!(report.evaluations[0].correct, 1);
    assert_eq!(report.evaluations[0].accuracy, 0.5);

    let log: EvaluationLog =
        serde_json::from_str(&std::fs::read_to_string(&report.log_path).unwrap()).unwrap();
    assert_eq!(log.eval_config.number_of_questions, 2);
    assert_eq!(log.log[0].answer, "A prova é dia 25/03.");
    assert_eq!(log.log[0].evaluation, "correct");
    assert!(log.log[0].reasoning.contains("Thought 1: Sei a data."));
    assert_eq!(log.log[1].expected_answer, "R$ 150");

    let csv = std::fs::read_to_string(&report.results_path).unwrap();
    assert!(csv.starts_with("evaluation_id,"));
    let mut reader = ::csv::Reader::from_path(&report.results_path).unwrap();
    assert_eq!(reader.records().count(), 2);

    let jsonl = std::fs::read_to_string(&report.evaluations_path).unwrap();
    assert_eq!(jsonl.lines().count(), 1);
    assert!(report.evaluations_path.starts_with(root.path().join("data/ci")));
}

#[tokio::test]
async fn failed_answer_is_logged_but_not_graded() {
    let root = tempfile::TempDir::new().unwrap();
    write_dataset(root.path());
    let settings = EvalSettings {
        max_dataset_questions: 1,
        ..settings(root.path())
    };

    let harness = TestHarness::builder()
        .with_config(|c| {
            settings.apply_to(c);
            c.agent.request_timeout_secs = 30;
            c.features.moderation = true;
        })
        .with_moderation(nsxbot_test_utils::MockModeration::failing())
        .build()
        .await
        .unwrap();
    let grader_llm = Arc::new(MockCompletion::new());

    let report = run_evaluation(&settings, harness.handler.clone(), Grader::new(grader_llm.clone()))
        .await
        .unwrap();

    let log: EvaluationLog =
        serde_json::from_str(&std::fs::read_to_string(&report.log_path).unwrap()).unwrap();
    assert_eq!(log.log.len(), 1);
    assert!(!log.log[0].answered);
    assert_eq!(log.log[0].evaluation, "not evaluated");
    assert_eq!(grader_llm.call_count().await, 0);
    assert_eq!(report.evaluations[0].evaluated, 0);
}

#[tokio::test]
async fn empty_dataset_dir_is_a_config_error() {
    let root = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(root.path().join("datasets")).unwrap();
    let settings = settings(root.path());
    let harness = TestHarness::builder().build().await.unwrap();

    let err = run_evaluation(
        &settings,
        harness.handler.clone(),
        Grader::new(Arc::new(MockCompletion::new())),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "DIALOG_CONFIG");
}
