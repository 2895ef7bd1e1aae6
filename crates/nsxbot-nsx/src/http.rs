// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP transport for the NSX endpoints.

use std::time::Duration;

use nsxbot_core::NsxbotError;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::types::ApiErrorBody;

/// HTTP client that retries requests which time out.
///
/// Only timeouts are retried; any response, including 5xx, is returned to
/// the caller as-is.
#[derive(Debug, Clone)]
pub(crate) struct NsxHttp {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u32,
}

impl NsxHttp {
    pub(crate) fn new(timeout: Duration, max_retries: u32) -> Result<Self, NsxbotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NsxbotError::Search {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            timeout,
            max_retries,
        })
    }

    pub(crate) async fn send(
        &self,
        what: &'static str,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, NsxbotError> {
        for attempt in 0..=self.max_retries {
            match build(&self.client).send().await {
                Ok(response) => {
                    debug!(endpoint = what, status = %response.status(), attempt, "NSX response received");
                    return Ok(response);
                }
                Err(e) if e.is_timeout() && attempt < self.max_retries => {
                    warn!(endpoint = what, attempt, "NSX request timed out, retrying");
                }
                Err(e) if e.is_timeout() => break,
                Err(e) => {
                    return Err(NsxbotError::Search {
                        message: format!("{what} request failed: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            }
        }
        Err(NsxbotError::Timeout {
            duration: self.timeout,
        })
    }
}

/// Converts a non-success response into the matching error.
pub(crate) async fn error_from_response(what: &str, response: reqwest::Response) -> NsxbotError {
    let status = response.status();
    if status == StatusCode::FORBIDDEN {
        return NsxbotError::Authentication(format!("{what}: invalid API key"));
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or(body);
    NsxbotError::search(format!("{what} returned {status}: {detail}"))
}

/// Parses a success body, reporting the endpoint on failure.
pub(crate) async fn json_body<T: serde::de::DeserializeOwned>(
    what: &str,
    response: reqwest::Response,
) -> Result<T, NsxbotError> {
    let body = response.text().await.map_err(|e| NsxbotError::Search {
        message: format!("failed to read {what} response: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| NsxbotError::Search {
        message: format!("failed to parse {what} response: {e}"),
        source: Some(Box::new(e)),
    })
}
