// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging gateway and the credentials it needs.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::NsxbotError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Menu;

/// Sends messages to end users through the messaging gateway.
///
/// `channel` is the business number the message is sent from; each number
/// has its own gateway credential.
#[async_trait]
pub trait OutboundMessenger: PluginAdapter {
    async fn send_text(&self, channel: &str, to: &str, body: &str) -> Result<(), NsxbotError>;

    async fn send_menu(&self, channel: &str, to: &str, menu: &Menu) -> Result<(), NsxbotError>;
}

/// Resolves per-channel gateway credentials.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn channel_key(&self, channel: &str) -> Result<SecretString, NsxbotError>;
}
