// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock outbound messenger and secret store.
//!
//! `MockMessenger` captures every message the gateway would send through
//! 360dialog; a [`Notify`] lets tests wait for background webhook
//! processing to deliver.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::{Mutex, Notify};

use nsxbot_core::traits::adapter::PluginAdapter;
use nsxbot_core::types::{AdapterType, HealthStatus, Menu};
use nsxbot_core::{NsxbotError, OutboundMessenger, SecretStore};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        channel: String,
        to: String,
        body: String,
    },
    Menu {
        channel: String,
        to: String,
        menu: Menu,
    },
}

impl Sent {
    /// Body of a text message, `None` for menus.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { body, .. } => Some(body),
            Self::Menu { .. } => None,
        }
    }
}

pub struct MockMessenger {
    sent: Arc<Mutex<Vec<Sent>>>,
    notify: Arc<Notify>,
    failing: bool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            failing: false,
        }
    }

    /// Every send fails with a `WEBHOOK` error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Waits until at least `count` messages were sent or `timeout` passes;
    /// returns whatever was captured.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Sent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            {
                let sent = self.sent.lock().await;
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.sent().await;
            }
        }
    }

    async fn capture(&self, message: Sent) -> Result<(), NsxbotError> {
        if self.failing {
            return Err(NsxbotError::Channel {
                message: "mock messenger rejected the message".into(),
                source: None,
            });
        }
        self.sent.lock().await.push(message);
        self.notify.notify_waiters();
        Ok(())
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockMessenger {
    fn name(&self) -> &str {
        "mock-messenger"
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
impl OutboundMessenger for MockMessenger {
    async fn send_text(&self, channel: &str, to: &str, body: &str) -> Result<(), NsxbotError> {
        self.capture(Sent::Text {
            channel: channel.to_string(),
            to: to.to_string(),
            body: body.to_string(),
        })
        .await
    }

    async fn send_menu(&self, channel: &str, to: &str, menu: &Menu) -> Result<(), NsxbotError> {
        self.capture(Sent::Menu {
            channel: channel.to_string(),
            to: to.to_string(),
            menu: menu.clone(),
        })
        .await
    }
}

/// Channel keys from a fixed map.
#[derive(Default)]
pub struct StaticSecrets(HashMap<String, String>);

impl StaticSecrets {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[async_trait]
impl SecretStore for StaticSecrets {
    async fn channel_key(&self, channel: &str) -> Result<SecretString, NsxbotError> {
        self.0
            .get(channel)
            .map(|key| SecretString::from(key.clone()))
            .ok_or_else(|| NsxbotError::Config(format!("no API key for channel {channel}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn captures_texts_and_menus() {
        let messenger = MockMessenger::new();
        messenger.send_text("553199", "5531988", "olá").await.unwrap();
        let menu = Menu {
            header: "Menu".into(),
            body: "Escolha".into(),
            footer: String::new(),
            button: "Opções".into(),
            options: Vec::new(),
        };
        messenger.send_menu("553199", "5531988", &menu).await.unwrap();

        let sent = messenger.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text(), Some("olá"));
        assert!(matches!(&sent[1], Sent::Menu { menu: m, .. } if m.header == "Menu"));
    }

    #[tokio::test]
    async fn wait_for_sees_messages_sent_later() {
        let messenger = Arc::new(MockMessenger::new());
        let sender = messenger.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sender.send_text("c", "u", "atrasada").await.unwrap();
        });
        let sent = messenger.wait_for(1, Duration::from_secs(2)).await;
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn failing_messenger_rejects() {
        let err = MockMessenger::failing()
            .send_text("c", "u", "x")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "WEBHOOK");
    }

    #[tokio::test]
    async fn static_secrets_lookup() {
        let secrets = StaticSecrets::new([("553199", "key-1")]);
        let key = secrets.channel_key("553199").await.unwrap();
        assert_eq!(key.expose_secret(), "key-1");
        assert!(secrets.channel_key("other").await.is_err());
    }
}
