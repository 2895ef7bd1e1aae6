// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-to-question similarity from the NSX score endpoint.

use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::types::{AdapterType, HealthStatus};
use nsxbot_core::{FaqScorer, NsxbotError, PluginAdapter};

use crate::http::{NsxHttp, error_from_response, json_body};
use crate::types::{ScoreRequest, ScoreResponse};

#[derive(Debug, Clone)]
pub struct NsxFaqScorer {
    http: NsxHttp,
    endpoint: String,
    language: String,
}

impl NsxFaqScorer {
    pub fn new(config: &NsxbotConfig) -> Result<Self, NsxbotError> {
        Ok(Self {
            http: NsxHttp::new(
                Duration::from_secs(config.nsx.timeout_secs),
                config.nsx.max_retries,
            )?,
            endpoint: config.nsx.score_endpoint.clone(),
            language: config.agent.language.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for NsxFaqScorer {
    fn name(&self) -> &str {
        "nsx-score"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FaqScorer
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FaqScorer for NsxFaqScorer {
    /// One score per question, in input order.
    async fn score(&self, query: &str, questions: &[String]) -> Result<Vec<f32>, NsxbotError> {
        if questions.is_empty() {
            return Ok(Vec::new());
        }
        let body = ScoreRequest {
            query,
            documents: questions,
            language: &self.language,
        };
        let response = self
            .http
            .send("nsx score", |client| client.post(&self.endpoint).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response("nsx score", response).await);
        }
        let ScoreResponse { results } = json_body("nsx score", response).await?;
        if results.len() != questions.len() {
            return Err(NsxbotError::search(format!(
                "nsx score returned {} scores for {} questions",
                results.len(),
                questions.len()
            )));
        }
        Ok(results.into_iter().map(|r| r.score).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scorer(server: &MockServer) -> NsxFaqScorer {
        let mut config = NsxbotConfig::default();
        config.nsx.score_endpoint = format!("{}/api/score", server.uri());
        NsxFaqScorer::new(&config).unwrap()
    }

    fn questions() -> Vec<String> {
        vec!["Qual a data da prova?".into(), "Como me inscrevo?".into()]
    }

    #[tokio::test]
    async fn scores_follow_question_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/score"))
            .and(body_json(serde_json::json!({
                "query": "quando é a prova",
                "documents": ["Qual a data da prova?", "Como me inscrevo?"],
                "language": "pt"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"score": 0.93}, {"score": 0.12}]
            })))
            .mount(&server)
            .await;

        let scores = scorer(&server)
            .score("quando é a prova", &questions())
            .await
            .unwrap();
        assert_eq!(scores, vec![0.93, 0.12]);
    }

    #[tokio::test]
    async fn mismatched_result_count_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"score": 0.5}]
            })))
            .mount(&server)
            .await;

        let err = scorer(&server)
            .score("prova", &questions())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NSX_SEARCH");
    }

    #[tokio::test]
    async fn no_questions_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let scores = scorer(&server).score("prova", &[]).await.unwrap();
        assert!(scores.is_empty());
    }
}
