// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Passage search against the NSX search endpoint.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::NsxbotConfig;
use nsxbot_config::model::NsxConfig;
use nsxbot_core::types::{AdapterType, HealthStatus, Passage, SearchRequest, SearchStrategy};
use nsxbot_core::{NsxbotError, PluginAdapter, SearchAdapter};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::http::{NsxHttp, error_from_response, json_body};
use crate::types::{NsxDocument, SearchResponse};

/// NSX search client.
///
/// API key resolution per request: the key configured for the index,
/// then `nsx.api_key`, then the `NSX_API_KEY` environment variable.
#[derive(Debug)]
pub struct NsxSearchClient {
    http: NsxHttp,
    endpoint: String,
    api_key: Option<SecretString>,
    index_keys: HashMap<String, SecretString>,
    fetch_docs: usize,
}

impl NsxSearchClient {
    pub fn new(config: &NsxConfig) -> Result<Self, NsxbotError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("NSX_API_KEY").ok())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        Ok(Self {
            http: NsxHttp::new(Duration::from_secs(config.timeout_secs), config.max_retries)?,
            endpoint: config.search_endpoint.clone(),
            api_key,
            index_keys: HashMap::new(),
            fetch_docs: config.max_docs_to_return,
        })
    }

    /// Builds the client with the per-index keys from `[[indexes]]`.
    pub fn from_config(config: &NsxbotConfig) -> Result<Self, NsxbotError> {
        let mut client = Self::new(&config.nsx)?;
        for index in &config.indexes {
            if let Some(key) = &index.api_key {
                client = client.with_index_key(&index.id, key.clone());
            }
        }
        Ok(client)
    }

    pub fn with_index_key(mut self, index: &str, key: String) -> Self {
        self.index_keys
            .insert(index.to_string(), SecretString::from(key));
        self
    }

    fn key_for(&self, index: &str) -> Result<&SecretString, NsxbotError> {
        self.index_keys
            .get(index)
            .or(self.api_key.as_ref())
            .ok_or_else(|| {
                NsxbotError::Authentication(format!("no NSX API key configured for index {index}"))
            })
    }

    /// Ranked documents for the request's strategy, up to the configured
    /// `max_docs_to_return` (never fewer than `request.max_docs`).
    pub async fn documents(&self, request: &SearchRequest) -> Result<Vec<NsxDocument>, NsxbotError> {
        let key = self.key_for(&request.index)?;
        let max_docs = self.fetch_docs.max(request.max_docs).to_string();
        let mut params = vec![
            ("index", request.index.as_str()),
            ("query", request.query.as_str()),
            ("max_docs_to_return", max_docs.as_str()),
            ("format_response", "false"),
        ];
        if request.strategy == SearchStrategy::Bm25 {
            params.push(("return_reference", "1"));
            params.push(("neural_ranking", "false"));
        }
        let url = reqwest::Url::parse_with_params(&self.endpoint, &params)
            .map_err(|e| NsxbotError::Config(format!("invalid nsx.search_endpoint: {e}")))?;
        let authorization = format!("APIKey {}", key.expose_secret());

        let response = self
            .http
            .send("nsx search", |client| {
                client
                    .get(url.clone())
                    .header("Authorization", authorization.as_str())
            })
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response("nsx search", response).await);
        }

        let body: SearchResponse = json_body("nsx search", response).await?;
        let docs = match request.strategy {
            SearchStrategy::Neural => body.response_reranker,
            SearchStrategy::Bm25 => body.response_reference,
        };
        debug!(
            index = %request.index,
            strategy = %request.strategy,
            docs = docs.len(),
            "nsx search completed"
        );
        Ok(docs)
    }
}

/// First paragraph of each document, in rank order, capped at `max_docs`.
pub(crate) fn to_passages(docs: Vec<NsxDocument>, max_docs: usize) -> Vec<Passage> {
    docs.into_iter()
        .filter_map(|doc| {
            let text = doc.first_paragraph()?.to_string();
            Some(Passage {
                text,
                title: doc.title,
                source_url: doc.source_url,
            })
        })
        .take(max_docs)
        .collect()
}

#[async_trait]
impl PluginAdapter for NsxSearchClient {
    fn name(&self) -> &str {
        "nsx"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Search
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        if self.api_key.is_none() && self.index_keys.is_empty() {
            return Ok(HealthStatus::Degraded("no NSX API key configured".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SearchAdapter for NsxSearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Passage>, NsxbotError> {
        let docs = self.documents(request).await?;
        Ok(to_passages(docs, request.max_docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> NsxConfig {
        NsxConfig {
            api_key: Some("nsx-test-key".into()),
            search_endpoint: format!("{}/api/search", server.uri()),
            timeout_secs: 2,
            max_retries: 1,
            ..NsxConfig::default()
        }
    }

    fn request(strategy: SearchStrategy, max_docs: usize) -> SearchRequest {
        SearchRequest {
            index: "FUNDEP_Ciencias".into(),
            query: "Data da prova".into(),
            strategy,
            max_docs,
        }
    }

    fn docs_body(key: &str) -> serde_json::Value {
        serde_json::json!({
            key: [
                {"paragraphs": ["A prova será no dia 25/03/2024."], "title": "Edital"},
                {"paragraphs": ["Inscrições até 12/02/2024."]},
                {"paragraphs": []}
            ]
        })
    }

    #[tokio::test]
    async fn neural_search_reads_reranker_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("index", "FUNDEP_Ciencias"))
            .and(query_param("query", "Data da prova"))
            .and(query_param("max_docs_to_return", "5"))
            .and(query_param("format_response", "false"))
            .and(header("Authorization", "APIKey nsx-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(docs_body("response_reranker")))
            .expect(1)
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server)).unwrap();
        let passages = client.search(&request(SearchStrategy::Neural, 1)).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "A prova será no dia 25/03/2024.");
        assert_eq!(passages[0].title.as_deref(), Some("Edital"));
    }

    #[tokio::test]
    async fn bm25_search_reads_reference_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/search"))
            .and(query_param("return_reference", "1"))
            .and(query_param("neural_ranking", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(docs_body("response_reference")))
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server)).unwrap();
        let passages = client.search(&request(SearchStrategy::Bm25, 5)).await.unwrap();
        // The document without paragraphs is skipped.
        assert_eq!(passages.len(), 2);
    }

    #[tokio::test]
    async fn empty_ranking_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response_reranker": []})),
            )
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server)).unwrap();
        let passages = client.search(&request(SearchStrategy::Neural, 1)).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn forbidden_maps_to_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server)).unwrap();
        let err = client.search(&request(SearchStrategy::Neural, 1)).await.unwrap_err();
        assert!(matches!(err, NsxbotError::Authentication(_)), "got {err:?}");
        assert_eq!(err.code(), "NSX_AUTHENTICATION");
    }

    #[tokio::test]
    async fn backend_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({"message": "index not found"})),
            )
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server)).unwrap();
        let err = client.search(&request(SearchStrategy::Neural, 1)).await.unwrap_err();
        assert!(err.to_string().contains("index not found"), "got {err}");
        assert_eq!(err.code(), "NSX_SEARCH");
    }

    #[tokio::test]
    async fn timeouts_are_retried_then_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(docs_body("response_reranker")),
            )
            .expect(2)
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&NsxConfig {
            timeout_secs: 1,
            ..config(&server)
        })
        .unwrap();
        let err = client.search(&request(SearchStrategy::Neural, 1)).await.unwrap_err();
        assert!(matches!(err, NsxbotError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn index_key_overrides_default_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "APIKey index-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(docs_body("response_reranker")))
            .expect(1)
            .mount(&server)
            .await;

        let client = NsxSearchClient::new(&config(&server))
            .unwrap()
            .with_index_key("FUNDEP_Ciencias", "index-key".into());
        client.search(&request(SearchStrategy::Neural, 1)).await.unwrap();
    }
}
