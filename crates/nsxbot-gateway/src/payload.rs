// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 360dialog webhook payloads and channel headers.

use axum::http::HeaderMap;
use nsxbot_config::NsxbotConfig;
use serde::Deserialize;

/// Body of `POST /webhook`: either inbound messages or delivery statuses.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WebhookEvent {
    Messages {
        #[serde(default)]
        contacts: Vec<serde_json::Value>,
        messages: Vec<WebhookMessage>,
    },
    Statuses { statuses: Vec<serde_json::Value> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub interactive: Option<Interactive>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interactive {
    #[serde(default)]
    pub list_reply: Option<ListReply>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListReply {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// What the gateway does with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The user picked an index from the menu.
    IndexSelected { from: String, index: String },
    Text { from: String, body: String },
    /// Media, reactions and anything else the bot does not answer.
    Unsupported { from: String, kind: String },
}

impl WebhookEvent {
    /// The first message of the event; statuses yield `None`.
    pub fn inbound(&self) -> Option<Inbound> {
        let Self::Messages { messages, .. } = self else {
            return None;
        };
        let message = messages.first()?;
        let from = message.from.clone();
        let reply = message
            .interactive
            .as_ref()
            .and_then(|i| i.list_reply.as_ref());
        Some(match (message.kind.as_str(), reply, &message.text) {
            ("interactive", Some(reply), _) => Inbound::IndexSelected {
                from,
                index: reply.id.clone(),
            },
            ("text", _, Some(text)) => Inbound::Text {
                from,
                body: text.body.clone(),
            },
            (kind, _, _) => Inbound::Unsupported {
                from,
                kind: kind.to_string(),
            },
        })
    }
}

/// One menu entry: an index id and the label shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexChoice {
    pub id: String,
    pub label: String,
}

/// Channel metadata the WhatsApp proxy attaches to every webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHeaders {
    /// Bot phone number (`nm-number`).
    pub number: String,
    /// Indexes offered on this number (`indexes` and `labels`).
    pub choices: Vec<IndexChoice>,
}

impl ChannelHeaders {
    /// Reads `nm-number`, `indexes` and `labels`; indexes fall back to the
    /// configured `[[indexes]]` when the header is absent. `None` without a
    /// bot number.
    pub fn from_headers(headers: &HeaderMap, config: &NsxbotConfig) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let number = get("nm-number")?.to_string();
        let choices = match get("indexes") {
            Some(indexes) => {
                let labels: Vec<&str> = get("labels")
                    .map(|l| l.split('$').map(str::trim).collect())
                    .unwrap_or_default();
                indexes
                    .split('$')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .enumerate()
                    .map(|(i, id)| IndexChoice {
                        id: id.to_string(),
                        label: labels
                            .get(i)
                            .filter(|l| !l.is_empty())
                            .unwrap_or(&id)
                            .to_string(),
                    })
                    .collect()
            }
            None => config
                .indexes
                .iter()
                .map(|index| IndexChoice {
                    id: index.id.clone(),
                    label: if index.label.is_empty() {
                        index.id.clone()
                    } else {
                        index.label.clone()
                    },
                })
                .collect(),
        };
        Some(Self { number, choices })
    }
}
