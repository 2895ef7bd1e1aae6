// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extractive answers from NSX Sense (MultidocQA) over search results.

use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::types::{AdapterType, HealthStatus, Passage, SearchRequest};
use nsxbot_core::{NsxbotError, PluginAdapter, SearchAdapter};
use tracing::debug;

use crate::http::{NsxHttp, error_from_response, json_body};
use crate::search::NsxSearchClient;
use crate::types::{SenseDocument, SenseRequest, SenseResponse};

/// Marker MultidocQA puts in its answer when the documents do not answer
/// the query.
pub const UNANSWERABLE_MARKER: &str = "irrespondível";

/// Search adapter that answers from the retrieved documents instead of
/// returning them.
///
/// Yields a single passage holding the predicted answer, or nothing when
/// search finds no documents or MultidocQA deems the query unanswerable.
#[derive(Debug)]
pub struct SenseClient {
    search: NsxSearchClient,
    http: NsxHttp,
    endpoint: String,
    language: String,
}

impl SenseClient {
    pub fn new(search: NsxSearchClient, config: &NsxbotConfig) -> Result<Self, NsxbotError> {
        Ok(Self {
            search,
            http: NsxHttp::new(
                Duration::from_secs(config.nsx.timeout_secs),
                config.nsx.max_retries,
            )?,
            endpoint: config.nsx.sense_endpoint.clone(),
            language: config.agent.language.clone(),
        })
    }

    pub async fn answer(
        &self,
        query: &str,
        index: &str,
        documents: Vec<SenseDocument>,
    ) -> Result<Option<String>, NsxbotError> {
        let body = SenseRequest {
            query,
            documents,
            language: &self.language,
            index,
        };
        let response = self
            .http
            .send("nsx sense", |client| client.post(&self.endpoint).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response("nsx sense", response).await);
        }
        let SenseResponse { pred_answer } = json_body("nsx sense", response).await?;
        if pred_answer.to_lowercase().contains(UNANSWERABLE_MARKER) {
            debug!(index, "sense found no answer");
            return Ok(None);
        }
        Ok(Some(pred_answer))
    }
}

#[async_trait]
impl PluginAdapter for SenseClient {
    fn name(&self) -> &str {
        "nsx-sense"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        self.search.health_check().await
    }
}

#[async_trait]
impl SearchAdapter for SenseClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Passage>, NsxbotError> {
        let documents: Vec<SenseDocument> = self
            .search
            .documents(request)
            .await?
            .iter()
            .filter_map(|doc| doc.first_paragraph())
            .map(|p| SenseDocument {
                paragraphs: p.to_string(),
            })
            .collect();
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        let answer = self
            .answer(&request.query, &request.index, documents)
            .await?;
        Ok(answer.map(Passage::new).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxbot_core::types::SearchStrategy;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> SenseClient {
        let mut config = NsxbotConfig::default();
        config.nsx.api_key = Some("k".into());
        config.nsx.search_endpoint = format!("{}/api/search", server.uri());
        config.nsx.sense_endpoint = format!("{}/api/multidocqa", server.uri());
        let search = NsxSearchClient::new(&config.nsx).unwrap();
        SenseClient::new(search, &config).unwrap()
    }

    fn request() -> SearchRequest {
        SearchRequest {
            index: "FUNDEP_Ciencias".into(),
            query: "Qual a data da prova?".into(),
            strategy: SearchStrategy::Neural,
            max_docs: 1,
        }
    }

    async fn mount_search(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response_reranker": [
                    {"paragraphs": ["A prova será no dia 25/03/2024."]},
                    {"paragraphs": ["O resultado sai em abril."]}
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn returns_predicted_answer() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/multidocqa"))
            .and(body_partial_json(serde_json::json!({
                "query": "Qual a data da prova?",
                "language": "pt",
                "index": "FUNDEP_Ciencias",
                "documents": [
                    {"paragraphs": "A prova será no dia 25/03/2024."},
                    {"paragraphs": "O resultado sai em abril."}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"pred_answer": "25/03/2024"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let passages = client(&server).await.search(&request()).await.unwrap();
        assert_eq!(passages, vec![Passage::new("25/03/2024")]);
    }

    #[tokio::test]
    async fn unanswerable_yields_no_passages() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/multidocqa"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"pred_answer": "Irrespondível"})),
            )
            .mount(&server)
            .await;

        let passages = client(&server).await.search(&request()).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn empty_search_skips_multidocqa() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response_reranker": []})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let passages = client(&server).await.search(&request()).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn multidocqa_error_uses_detail() {
        let server = MockServer::start().await;
        mount_search(&server).await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(serde_json::json!({"detail": "documents must not be empty"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).await.search(&request()).await.unwrap_err();
        assert!(err.to_string().contains("documents must not be empty"), "got {err}");
    }
}
