// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch of inbound WhatsApp messages.
//!
//! Menu selections set the user's active index. Text is answered against
//! that index; users with no index on a multi-index number get the menu.

use std::sync::Arc;

use nsxbot_agent::ChatHandler;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::types::{Menu, MenuOption, UserKey};
use nsxbot_core::{MemoryStore, NsxbotError, OutboundMessenger};
use tracing::{debug, error, info, instrument};

use crate::payload::{ChannelHeaders, Inbound};

/// What the processor did with one message; returned for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    IndexSelected(String),
    MenuSent,
    Answered { index: String },
    ErrorReported(&'static str),
    Ignored,
}

pub struct WebhookProcessor {
    handler: Arc<ChatHandler>,
    messenger: Arc<dyn OutboundMessenger>,
    sessions: Arc<dyn MemoryStore>,
    config: Arc<NsxbotConfig>,
}

impl WebhookProcessor {
    pub fn new(
        handler: Arc<ChatHandler>,
        messenger: Arc<dyn OutboundMessenger>,
        sessions: Arc<dyn MemoryStore>,
        config: Arc<NsxbotConfig>,
    ) -> Self {
        Self {
            handler,
            messenger,
            sessions,
            config,
        }
    }

    pub fn handler(&self) -> &Arc<ChatHandler> {
        &self.handler
    }

    /// Handles one inbound message. Failures are reported to the user with
    /// their error code and logged; nothing is returned to the webhook caller.
    #[instrument(skip_all, fields(channel = %channel.number))]
    pub async fn process(&self, channel: &ChannelHeaders, inbound: Inbound) -> Dispatch {
        let from = match &inbound {
            Inbound::IndexSelected { from, .. }
            | Inbound::Text { from, .. }
            | Inbound::Unsupported { from, .. } => from.clone(),
        };
        match self.dispatch(channel, inbound).await {
            Ok(dispatch) => dispatch,
            Err(e) => {
                let code = e.code();
                error!(user_id = %from, code, error = %e, "failed to process webhook message");
                let text = self.config.gateway.error_message.replace("{code}", code);
                if let Err(send_err) = self.messenger.send_text(&channel.number, &from, &text).await {
                    error!(user_id = %from, error = %send_err, "failed to send error reply");
                }
                Dispatch::ErrorReported(code)
            }
        }
    }

    async fn dispatch(
        &self,
        channel: &ChannelHeaders,
        inbound: Inbound,
    ) -> Result<Dispatch, NsxbotError> {
        match inbound {
            Inbound::IndexSelected { from, index } => {
                let key = UserKey::new(&from, &channel.number);
                self.sessions.set_active_index(&key, &index).await?;
                info!(user_id = %from, %index, "index selected");
                self.introduce(channel, &from, &index).await?;
                Ok(Dispatch::IndexSelected(index))
            }
            Inbound::Text { from, body } => self.answer(channel, &from, &body).await,
            Inbound::Unsupported { from, kind } => {
                debug!(user_id = %from, %kind, "ignoring unsupported message type");
                Ok(Dispatch::Ignored)
            }
        }
    }

    async fn answer(
        &self,
        channel: &ChannelHeaders,
        from: &str,
        body: &str,
    ) -> Result<Dispatch, NsxbotError> {
        let key = UserKey::new(from, &channel.number);
        let mut active = self.sessions.active_index(&key).await?;

        if active.is_none() {
            match channel.choices.as_slice() {
                [] => active = Some(self.config.nsx.default_index.clone()),
                [only] => {
                    self.sessions.set_active_index(&key, &only.id).await?;
                    active = Some(only.id.clone());
                }
                _ => {}
            }
        }

        let wants_menu = body.trim() == self.config.gateway.menu_command;
        let index = match active {
            Some(index) if !(wants_menu && channel.choices.len() > 1) => index,
            _ => {
                self.messenger
                    .send_menu(&channel.number, from, &self.menu(channel))
                    .await?;
                return Ok(Dispatch::MenuSent);
            }
        };

        let reply = self.handler.respond(body, &key, &index).await?;
        self.messenger
            .send_text(&channel.number, from, &reply.text)
            .await?;
        info!(user_id = %from, %index, outcome = %reply.outcome, "reply sent");
        Ok(Dispatch::Answered { index })
    }

    /// Sends the index greeting and, when configured, its disclaimer.
    async fn introduce(
        &self,
        channel: &ChannelHeaders,
        to: &str,
        index: &str,
    ) -> Result<(), NsxbotError> {
        let configured = self.config.index(index);
        let intro = configured
            .and_then(|i| i.intro_message.as_deref())
            .unwrap_or(self.config.gateway.default_intro_message.as_str());
        self.messenger.send_text(&channel.number, to, intro).await?;
        if let Some(disclaimer) = configured.and_then(|i| i.disclaimer.as_deref()) {
            self.messenger
                .send_text(&channel.number, to, disclaimer)
                .await?;
        }
        Ok(())
    }

    fn menu(&self, channel: &ChannelHeaders) -> Menu {
        let gateway = &self.config.gateway;
        Menu {
            header: String::new(),
            body: gateway.menu_message.clone(),
            footer: gateway.menu_footer.clone(),
            button: gateway.menu_button.clone(),
            options: channel
                .choices
                .iter()
                .map(|choice| MenuOption {
                    id: choice.id.clone(),
                    title: choice.label.clone(),
                    description: String::new(),
                })
                .collect(),
        }
    }
}
