// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport shared by the completion and moderation adapters.

use std::time::Duration;

use nsxbot_core::NsxbotError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// JSON-over-HTTP client that retries requests which time out.
///
/// Connection failures and error statuses are returned without retrying.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    max_retries: u32,
}

impl ServiceClient {
    pub fn new(endpoint: String, timeout: Duration, max_retries: u32) -> Result<Self, NsxbotError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NsxbotError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            endpoint,
            timeout,
            max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POSTs `body` and decodes a successful response.
    ///
    /// `on_error` builds the error for an HTTP failure from its status and
    /// body text.
    pub async fn post_json<B, T>(
        &self,
        body: &B,
        on_error: impl FnOnce(reqwest::StatusCode, String) -> NsxbotError,
    ) -> Result<T, NsxbotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 0;
        let response = loop {
            match self.client.post(&self.endpoint).json(body).send().await {
                Ok(response) => break response,
                Err(e) if e.is_timeout() => {
                    if attempt >= self.max_retries {
                        return Err(NsxbotError::Timeout {
                            duration: self.timeout,
                        });
                    }
                    attempt += 1;
                    warn!(endpoint = %self.endpoint, attempt, "request timed out, retrying");
                }
                Err(e) => {
                    return Err(NsxbotError::Provider {
                        message: format!("HTTP request to {} failed: {e}", self.endpoint),
                        source: Some(Box::new(e)),
                    });
                }
            }
        };

        let status = response.status();
        debug!(endpoint = %self.endpoint, status = %status, attempt, "response received");
        let text = response.text().await.map_err(|e| NsxbotError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !status.is_success() {
            return Err(on_error(status, text));
        }
        serde_json::from_str(&text).map_err(|e| NsxbotError::Provider {
            message: format!("failed to parse response from {}: {e}", self.endpoint),
            source: Some(Box::new(e)),
        })
    }
}
