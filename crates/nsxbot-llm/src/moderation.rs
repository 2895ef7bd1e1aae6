// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderation service adapter.

use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::model::LlmConfig;
use nsxbot_core::types::{AdapterType, HealthStatus};
use nsxbot_core::{ModerationAdapter, NsxbotError, PluginAdapter};
use tracing::info;

use crate::client::ServiceClient;
use crate::types::{ModerationRequest, ModerationResponse};

pub struct ModerationClient {
    http: ServiceClient,
    service: String,
}

impl ModerationClient {
    pub fn new(config: &LlmConfig) -> Result<Self, NsxbotError> {
        Ok(Self {
            http: ServiceClient::new(
                config.moderation_endpoint.clone(),
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?,
            service: config.service.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for ModerationClient {
    fn name(&self) -> &str {
        "moderation"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Moderation
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ModerationAdapter for ModerationClient {
    async fn is_flagged(&self, text: &str) -> Result<bool, NsxbotError> {
        let body = ModerationRequest {
            service: &self.service,
            input: [text],
        };
        let response: ModerationResponse = self
            .http
            .post_json(&body, |status, text| {
                NsxbotError::Moderation(format!("moderation returned {status}: {text}"))
            })
            .await
            .map_err(|e| match e {
                NsxbotError::Moderation(_) => e,
                other => NsxbotError::Moderation(other.to_string()),
            })?;
        let flagged = response
            .results
            .first()
            .map(|r| r.flagged)
            .ok_or_else(|| NsxbotError::Moderation("moderation returned no results".into()))?;
        if flagged {
            info!("message flagged by moderation");
        }
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ModerationClient {
        ModerationClient::new(&LlmConfig {
            moderation_endpoint: format!("{}/api/openai/moderations", server.uri()),
            ..LlmConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn flagged_result_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/openai/moderations"))
            .and(body_json(serde_json::json!({
                "service": "ChatBot",
                "input": ["texto ofensivo"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"flagged": true}]
            })))
            .mount(&server)
            .await;

        assert!(client(&server).is_flagged("texto ofensivo").await.unwrap());
    }

    #[tokio::test]
    async fn clean_text_passes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"flagged": false}]
            })))
            .mount(&server)
            .await;

        assert!(!client(&server).is_flagged("bom dia").await.unwrap());
    }

    #[tokio::test]
    async fn service_failure_is_a_moderation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server).is_flagged("bom dia").await.unwrap_err();
        assert_eq!(err.code(), "MODERATION");
    }

    #[tokio::test]
    async fn empty_results_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).is_flagged("bom dia").await.is_err());
    }
}
