// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM grading of chatbot answers against reference answers.

use std::sync::Arc;

use nsxbot_core::types::{ChatMessage, CompletionRequest, Role, TokenUsage};
use nsxbot_core::{CompletionAdapter, NsxbotError};
use serde::{Deserialize, Serialize};

/// Name recorded in reports for the grading prompt below.
pub const EVALUATOR_NAME: &str = "nsxbot-qa-grader-v1";

const SYSTEM_PROMPT: &str = "Você é um avaliador de respostas de um assistente virtual. \
Compare a resposta do assistente com a resposta de referência. A resposta é correta \
quando contém a informação da referência, mesmo com outras palavras, e não a contradiz. \
Responda somente com `Avaliação: correct` ou `Avaliação: incorrect`.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Correct,
    Incorrect,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Graded {
    pub grade: Grade,
    pub usage: TokenUsage,
}

pub struct Grader {
    llm: Arc<dyn CompletionAdapter>,
}

impl Grader {
    pub fn new(llm: Arc<dyn CompletionAdapter>) -> Self {
        Self { llm }
    }

    pub async fn grade(
        &self,
        question: &str,
        answer: &str,
        reference: &str,
    ) -> Result<Graded, NsxbotError> {
        let content = format!(
            "Pergunta: {question}\nResposta de referência: {reference}\nResposta do assistente: {}",
            answer.trim()
        );
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::text(Role::System, SYSTEM_PROMPT),
                ChatMessage::text(Role::User, content),
            ],
            ..Default::default()
        };
        let response = self.llm.complete(request).await?;
        let grade = parse_grade(&response.text_or_empty())?;
        Ok(Graded {
            grade,
            usage: response.usage,
        })
    }
}

/// Reads `Avaliação: correct|incorrect`; the label before the colon is
/// optional.
pub fn parse_grade(text: &str) -> Result<Grade, NsxbotError> {
    let verdict = text
        .split_once(':')
        .map_or(text, |(_, verdict)| verdict)
        .trim()
        .trim_end_matches('.')
        .to_lowercase();
    match verdict.as_str() {
        "correct" => Ok(Grade::Correct),
        "incorrect" => Ok(Grade::Incorrect),
        _ => Err(NsxbotError::Parse(format!("unexpected grade `{}`", text.trim()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxbot_test_utils::MockCompletion;

    #[test]
    fn parses_labelled_and_bare_grades() {
        assert_eq!(parse_grade("Avaliação: correct").unwrap(), Grade::Correct);
        assert_eq!(parse_grade(" Incorrect.").unwrap(), Grade::Incorrect);
        assert_eq!(parse_grade("Avaliação: talvez").unwrap_err().code(), "PARSE");
    }

    #[tokio::test]
    async fn grading_prompt_carries_question_and_reference() {
        let llm = Arc::new(MockCompletion::with_texts(["Avaliação: correct"]));
        let grader = Grader::new(llm.clone());

        let graded = grader
            .grade("Quando é a prova?", " Dia 25/03. ", "25 de março")
            .await
            .unwrap();
        assert_eq!(graded.grade, Grade::Correct);
        assert_eq!(graded.usage.total_tokens, 30);

        let request = &llm.requests().await[0];
        assert_eq!(request.messages[0].role, Role::System);
        let user = request.messages[1].content.as_deref().unwrap();
        assert!(user.contains("Resposta de referência: 25 de março"));
        assert!(user.ends_with("Resposta do assistente: Dia 25/03."));
    }
}
