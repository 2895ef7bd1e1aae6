// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Question datasets.
//!
//! One JSON file per index:
//!
//! ```json
//! {"index": "FUNDEP_Ciencias",
//!  "questions": [{"id": "q1", "answer": "25/03", "variants": ["Quando é a prova?"]}]}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use nsxbot_core::NsxbotError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub index: String,
    pub questions: Vec<DatasetQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetQuestion {
    pub id: String,
    /// Reference answer the grader compares against.
    pub answer: String,
    /// Phrasings of the same question.
    pub variants: Vec<String>,
}

/// One variant to ask, with what it is graded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCase {
    /// `<question id>_<variant position>`.
    pub vqid: String,
    pub qid: String,
    pub index: String,
    pub question: String,
    pub gold_answer: String,
}

/// Reads every `*.json` file in `dir`, in file name order. Unreadable files
/// are skipped with a warning.
pub async fn load_datasets(dir: &Path) -> Result<Vec<Dataset>, NsxbotError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        NsxbotError::Config(format!("cannot read dataset dir {}: {e}", dir.display()))
    })?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(NsxbotError::storage)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut datasets = Vec::with_capacity(paths.len());
    for path in paths {
        let parsed = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Dataset>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(dataset) => {
                debug!(path = %path.display(), index = %dataset.index, questions = dataset.questions.len(), "dataset loaded");
                datasets.push(dataset);
            }
            Err(error) => warn!(path = %path.display(), %error, "skipping unreadable dataset"),
        }
    }
    Ok(datasets)
}

/// Keeps datasets whose index is in `only` (all when empty), then renames
/// indexes through `mapping`.
pub fn select(
    datasets: Vec<Dataset>,
    only: &[String],
    mapping: &BTreeMap<String, String>,
) -> Vec<Dataset> {
    datasets
        .into_iter()
        .filter(|d| only.is_empty() || only.contains(&d.index))
        .map(|mut d| {
            if let Some(renamed) = mapping.get(&d.index) {
                d.index = renamed.clone();
            }
            d
        })
        .collect()
}

/// Flattens datasets into the cases to ask, honoring the per-dataset
/// question limit and the per-question variant limit.
pub fn question_pool(
    datasets: &[Dataset],
    max_questions: Option<usize>,
    max_variants: Option<usize>,
) -> Vec<QuestionCase> {
    datasets
        .iter()
        .flat_map(|dataset| {
            dataset
                .questions
                .iter()
                .take(max_questions.unwrap_or(usize::MAX))
                .flat_map(move |question| {
                    question
                        .variants
                        .iter()
                        .take(max_variants.unwrap_or(usize::MAX))
                        .enumerate()
                        .map(move |(position, variant)| QuestionCase {
                            vqid: format!("{}_{position}", question.id),
                            qid: question.id.clone(),
                            index: dataset.index.clone(),
                            question: variant.clone(),
                            gold_answer: question.answer.clone(),
                        })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(index: &str, questions: usize, variants: usize) -> Dataset {
        Dataset {
            index: index.into(),
            questions: (0..questions)
                .map(|q| DatasetQuestion {
                    id: format!("q{q}"),
                    answer: format!("resposta {q}"),
                    variants: (0..variants).map(|v| format!("pergunta {q}.{v}")).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn pool_honors_limits() {
        let datasets = [dataset("A", 3, 3), dataset("B", 1, 2)];
        let pool = question_pool(&datasets, Some(2), Some(1));
        let ids: Vec<_> = pool.iter().map(|c| (c.index.as_str(), c.vqid.as_str())).collect();
        assert_eq!(ids, [("A", "q0_0"), ("A", "q1_0"), ("B", "q0_0")]);
        assert_eq!(pool[1].gold_answer, "resposta 1");
    }

    #[test]
    fn unlimited_pool_takes_everything() {
        let pool = question_pool(&[dataset("A", 2, 3)], None, None);
        assert_eq!(pool.len(), 6);
        assert_eq!(pool[5].question, "pergunta 1.2");
    }

    #[test]
    fn select_filters_then_renames() {
        let mapping = BTreeMap::from([("A".to_string(), "A_v2".to_string())]);
        let selected = select(
            vec![dataset("A", 1, 1), dataset("B", 1, 1)],
            &["A".to_string()],
            &mapping,
        );
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].index, "A_v2");
    }

    #[tokio::test]
    async fn loads_json_files_in_name_order() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            serde_json::to_string(&dataset("B", 1, 1)).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            serde_json::to_string(&dataset("A", 1, 1)).unwrap(),
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let datasets = load_datasets(dir.path()).await.unwrap();
        let indexes: Vec<_> = datasets.iter().map(|d| d.index.as_str()).collect();
        assert_eq!(indexes, ["A", "B"]);
    }
}
