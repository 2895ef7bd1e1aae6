// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replays question cases through the chat handler and grades the answers.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use futures::stream;
use indicatif::{ProgressBar, ProgressStyle};
use nsxbot_agent::ChatHandler;
use nsxbot_core::types::{TokenUsage, UserKey};
use tracing::warn;

use crate::dataset::QuestionCase;
use crate::grader::Grader;

/// Reasoning recorded when the handler returned an error.
pub const UNAVAILABLE_REASONING: &str = "Indisponível";
/// Answer recorded when the handler returned an error.
pub const UNANSWERED: &str = "Erro ao obter a resposta para a pergunta.";
pub const NOT_EVALUATED: &str = "not evaluated";

#[derive(Debug, Clone)]
pub struct CaseResult {
    pub case: QuestionCase,
    pub answer: String,
    pub reasoning: String,
    /// `correct`, `incorrect` or `not evaluated`.
    pub evaluation: String,
    pub answered: bool,
    pub evaluated: bool,
    /// Seconds the handler took to answer.
    pub latency: f64,
    pub eval_usage: TokenUsage,
}

impl CaseResult {
    pub fn is_correct(&self) -> bool {
        self.evaluated && self.evaluation == "correct"
    }
}

pub struct EvalRunner {
    handler: Arc<ChatHandler>,
    grader: Grader,
    concurrency: usize,
}

impl EvalRunner {
    pub fn new(handler: Arc<ChatHandler>, grader: Grader, concurrency: usize) -> Self {
        Self {
            handler,
            grader,
            concurrency: concurrency.max(1),
        }
    }

    /// Runs every case, at most `concurrency` at a time. Results keep the
    /// order of `cases`.
    pub async fn run(&self, cases: Vec<QuestionCase>) -> Vec<CaseResult> {
        let bar = ProgressBar::new(cases.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} ({percent}%) eta {eta} elapsed {elapsed}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("Evaluation progress:");

        let results = stream::iter(cases)
            .map(|case| {
                let bar = bar.clone();
                async move {
                    let result = self.run_case(case).await;
                    bar.inc(1);
                    result
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;
        bar.finish();
        results
    }

    async fn run_case(&self, case: QuestionCase) -> CaseResult {
        let user = UserKey::new(case.vqid.as_str(), format!("{}_chat", case.index));
        let started = Instant::now();
        let reply = self.handler.respond(&case.question, &user, &case.index).await;
        let latency = started.elapsed().as_secs_f64();

        let (answer, reasoning) = match reply {
            Ok(reply) => (reply.answer, reply.trace),
            Err(e) => {
                warn!(vqid = %case.vqid, index = %case.index, code = e.code(), error = %e, "no answer for question");
                return CaseResult {
                    case,
                    answer: UNANSWERED.to_string(),
                    reasoning: UNAVAILABLE_REASONING.to_string(),
                    evaluation: NOT_EVALUATED.to_string(),
                    answered: false,
                    evaluated: false,
                    latency,
                    eval_usage: TokenUsage::default(),
                };
            }
        };

        let graded = self
            .grader
            .grade(&case.question, &answer, &case.gold_answer)
            .await;
        let (evaluation, evaluated, eval_usage) = match graded {
            Ok(graded) => (graded.grade.as_str().to_string(), true, graded.usage),
            Err(e) => {
                warn!(vqid = %case.vqid, code = e.code(), error = %e, "answer not graded");
                (NOT_EVALUATED.to_string(), false, TokenUsage::default())
            }
        };

        CaseResult {
            case,
            answer: answer.trim().to_string(),
            reasoning: reasoning.trim().to_string(),
            evaluation,
            answered: true,
            evaluated,
            latency,
            eval_usage,
        }
    }
}
