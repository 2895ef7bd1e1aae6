// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk evaluation reports and the accuracy summary.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use nsxbot_core::NsxbotError;
use serde::{Deserialize, Serialize};

use crate::runner::CaseResult;

/// One answered question; a row of the results CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerLog {
    pub evaluation_id: String,
    pub timestamp: String,
    pub chatbot_version: String,
    pub evaluator: String,
    pub index: String,
    pub question: String,
    pub expected_answer: String,
    pub answer: String,
    pub evaluation: String,
    pub reasoning: String,
    pub answered: bool,
    pub evaluated: bool,
    pub latency: f64,
    pub eval_prompt_tokens: u32,
    pub eval_completion_tokens: u32,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub id: String,
    pub pipeline: String,
    pub model: String,
    pub memory: bool,
    pub faq: bool,
    pub sense: bool,
    pub bm25_only: bool,
    pub number_of_questions: usize,
    pub timestamp: String,
    pub chatbot_version: String,
    pub evaluator: String,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationLog {
    pub eval_config: EvaluationConfig,
    pub log: Vec<AnswerLog>,
}

/// Accuracy of one index over its graded answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEvaluation {
    pub index: String,
    pub questions: usize,
    pub evaluated: usize,
    pub correct: usize,
    /// `correct / evaluated`, 0 when nothing was graded.
    pub accuracy: f64,
}

/// Per-index accuracy, in the order of `indexes`.
pub fn index_evaluations(indexes: &[String], results: &[CaseResult]) -> Vec<IndexEvaluation> {
    indexes
        .iter()
        .map(|index| {
            let of_index: Vec<_> = results.iter().filter(|r| &r.case.index == index).collect();
            let evaluated = of_index.iter().filter(|r| r.evaluated).count();
            let correct = of_index.iter().filter(|r| r.is_correct()).count();
            IndexEvaluation {
                index: index.clone(),
                questions: of_index.len(),
                evaluated,
                correct,
                accuracy: if evaluated == 0 {
                    0.0
                } else {
                    correct as f64 / evaluated as f64
                },
            }
        })
        .collect()
}

pub fn write_log(path: &Path, log: &EvaluationLog) -> Result<(), NsxbotError> {
    let json = serde_json::to_string_pretty(log).map_err(NsxbotError::storage)?;
    std::fs::write(path, json).map_err(NsxbotError::storage)
}

pub fn write_results_csv(path: &Path, rows: &[AnswerLog]) -> Result<(), NsxbotError> {
    let mut writer = csv::Writer::from_path(path).map_err(NsxbotError::storage)?;
    for row in rows {
        writer.serialize(row).map_err(NsxbotError::storage)?;
    }
    writer.flush().map_err(NsxbotError::storage)
}

/// One `{"<index>": {...}}` object per line.
pub fn write_evaluations_jsonl(
    path: &Path,
    evaluations: &[IndexEvaluation],
) -> Result<(), NsxbotError> {
    let mut file = std::fs::File::create(path).map_err(NsxbotError::storage)?;
    for evaluation in evaluations {
        let keyed = BTreeMap::from([(evaluation.index.as_str(), evaluation)]);
        let line = serde_json::to_string(&keyed).map_err(NsxbotError::storage)?;
        writeln!(file, "{line}").map_err(NsxbotError::storage)?;
    }
    Ok(())
}

/// Fixed-width `Index | Accuracy` table.
pub fn summary_table(evaluations: &[IndexEvaluation]) -> String {
    let width = evaluations
        .iter()
        .map(|e| e.index.chars().count())
        .chain(["Index".len()])
        .max()
        .unwrap_or_default();
    let mut table = format!("{:<width$} | Accuracy | Graded\n", "Index");
    table.push_str(&format!("{}-+----------+-------\n", "-".repeat(width)));
    for e in evaluations {
        let _ = writeln!(
            table,
            "{:<width$} | {:>7.1}% | {}/{}",
            e.index,
            e.accuracy * 100.0,
            e.evaluated,
            e.questions
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::QuestionCase;
    use nsxbot_core::types::TokenUsage;

    fn result(index: &str, evaluation: &str, evaluated: bool) -> CaseResult {
        CaseResult {
            case: QuestionCase {
                vqid: "q_0".into(),
                qid: "q".into(),
                index: index.into(),
                question: "pergunta".into(),
                gold_answer: "resposta".into(),
            },
            answer: "resposta".into(),
            reasoning: String::new(),
            evaluation: evaluation.into(),
            answered: true,
            evaluated,
            latency: 0.5,
            eval_usage: TokenUsage::default(),
        }
    }

    fn evaluation(index: &str, accuracy: f64) -> IndexEvaluation {
        IndexEvaluation {
            index: index.into(),
            questions: 4,
            evaluated: 4,
            correct: (accuracy * 4.0) as usize,
            accuracy,
        }
    }

    #[test]
    fn accuracy_counts_only_graded_answers() {
        let results = [
            result("A", "correct", true),
            result("A", "incorrect", true),
            result("A", "not evaluated", false),
            result("B", "correct", true),
        ];
        let evaluations = index_evaluations(&["A".into(), "B".into(), "C".into()], &results);
        assert_eq!(evaluations[0].questions, 3);
        assert_eq!(evaluations[0].evaluated, 2);
        assert_eq!(evaluations[0].accuracy, 0.5);
        assert_eq!(evaluations[1].accuracy, 1.0);
        assert_eq!(evaluations[2].questions, 0);
        assert_eq!(evaluations[2].accuracy, 0.0);
    }

    #[test]
    fn jsonl_has_one_keyed_object_per_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("evaluations.jsonl");
        write_evaluations_jsonl(&path, &[evaluation("A", 0.75), evaluation("B", 0.5)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["A"]["accuracy"], 0.75);
        assert_eq!(lines[1]["B"]["correct"], 2);
    }

    #[test]
    fn summary_lists_percentages() {
        let table = summary_table(&[evaluation("FUNDEP_Ciencias", 0.75)]);
        assert!(table.starts_with("Index"));
        assert!(table.contains("FUNDEP_Ciencias |    75.0% | 4/4"));
    }
}
