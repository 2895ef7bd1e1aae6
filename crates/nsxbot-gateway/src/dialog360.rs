// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound WhatsApp messages through the 360dialog API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nsxbot_config::model::GatewayConfig;
use nsxbot_core::types::{AdapterType, HealthStatus, Menu};
use nsxbot_core::{NsxbotError, OutboundMessenger, PluginAdapter, SecretStore};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;

/// Header carrying the per-number 360dialog key.
pub const API_KEY_HEADER: &str = "D360-Api-Key";

/// Title of the single section of an index menu.
const MENU_SECTION_TITLE: &str = "Escolha uma das opções";

pub struct Dialog360Client {
    client: reqwest::Client,
    text_url: String,
    secrets: Arc<dyn SecretStore>,
    max_chars: usize,
}

impl Dialog360Client {
    pub fn new(config: &GatewayConfig, secrets: Arc<dyn SecretStore>) -> Result<Self, NsxbotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NsxbotError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            text_url: config.text_url.clone(),
            secrets,
            max_chars: config.max_message_chars,
        })
    }

    async fn post(&self, channel: &str, payload: serde_json::Value) -> Result<(), NsxbotError> {
        let key = self.secrets.channel_key(channel).await?;
        let response = self
            .client
            .post(&self.text_url)
            .header(API_KEY_HEADER, key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| NsxbotError::Channel {
                message: format!("360dialog request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NsxbotError::Channel {
                message: format!("360dialog returned {status}: {body}"),
                source: None,
            });
        }
        debug!(channel, %status, "360dialog message accepted");
        Ok(())
    }
}

/// Cuts `text` to at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn menu_payload(to: &str, menu: &Menu) -> serde_json::Value {
    let rows: Vec<_> = menu
        .options
        .iter()
        .map(|option| {
            json!({
                "id": option.id,
                "title": option.title,
                "description": option.description,
            })
        })
        .collect();
    json!({
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "list",
            "header": {"type": "text", "text": menu.header},
            "body": {"text": menu.body},
            "footer": {"text": menu.footer},
            "action": {
                "button": menu.button,
                "sections": [{"title": MENU_SECTION_TITLE, "rows": rows}],
            },
        },
    })
}

#[async_trait]
impl PluginAdapter for Dialog360Client {
    fn name(&self) -> &str {
        "360dialog"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messenger
    }

    async fn health_check(&self) -> Result<HealthStatus, NsxbotError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl OutboundMessenger for Dialog360Client {
    async fn send_text(&self, channel: &str, to: &str, body: &str) -> Result<(), NsxbotError> {
        let payload = json!({
            "to": to,
            "type": "text",
            "text": {"body": truncate_chars(body, self.max_chars)},
        });
        self.post(channel, payload).await
    }

    async fn send_menu(&self, channel: &str, to: &str, menu: &Menu) -> Result<(), NsxbotError> {
        self.post(channel, menu_payload(to, menu)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsxbot_core::types::MenuOption;

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("curto", 10), "curto");
    }

    #[test]
    fn menu_payload_lists_every_option() {
        let menu = Menu {
            header: String::new(),
            body: "Escolha".into(),
            footer: "Envie #menu".into(),
            button: "Selecione".into(),
            options: vec![
                MenuOption {
                    id: "A".into(),
                    title: "Índice A".into(),
                    description: String::new(),
                },
                MenuOption {
                    id: "B".into(),
                    title: "Índice B".into(),
                    description: String::new(),
                },
            ],
        };
        let payload = menu_payload("5531", &menu);
        assert_eq!(payload["interactive"]["type"], "list");
        let rows = &payload["interactive"]["action"]["sections"][0]["rows"];
        assert_eq!(rows[1]["id"], "B");
        assert_eq!(payload["interactive"]["action"]["button"], "Selecione");
    }
}
