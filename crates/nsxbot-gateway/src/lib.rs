// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp gateway for nsxbot.
//!
//! Receives 360dialog webhooks, answers them through the chat handler and
//! replies with the 360dialog messages API. Also serves a synchronous chat
//! endpoint for integrations and a health probe.

pub mod dialog360;
pub mod handlers;
pub mod payload;
pub mod secrets;
pub mod server;
pub mod webhook;

pub use dialog360::Dialog360Client;
pub use payload::{ChannelHeaders, Inbound, WebhookEvent};
pub use secrets::ConfigSecretStore;
pub use server::{GatewayState, router, start_server};
pub use webhook::{Dispatch, WebhookProcessor};
