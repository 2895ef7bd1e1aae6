// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! 360dialog API keys per bot number.

use std::collections::BTreeMap;

use async_trait::async_trait;
use nsxbot_core::{NsxbotError, SecretStore};
use secrecy::{ExposeSecret, SecretString};

/// Prefix of the environment variables holding channel keys.
pub const KEY_ENV_PREFIX: &str = "NSXBOT_D360_KEY_";

/// Keys from `[secrets]` (bot number to key), then from
/// `NSXBOT_D360_KEY_<number>`.
pub struct ConfigSecretStore {
    keys: BTreeMap<String, SecretString>,
}

impl ConfigSecretStore {
    pub fn new(secrets: &BTreeMap<String, String>) -> Self {
        Self {
            keys: secrets
                .iter()
                .map(|(number, key)| (number.clone(), SecretString::from(key.clone())))
                .collect(),
        }
    }
}

impl std::fmt::Debug for ConfigSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigSecretStore")
            .field("channels", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl SecretStore for ConfigSecretStore {
    async fn channel_key(&self, channel: &str) -> Result<SecretString, NsxbotError> {
        if let Some(key) = self.keys.get(channel) {
            return Ok(SecretString::from(key.expose_secret()));
        }
        std::env::var(format!("{KEY_ENV_PREFIX}{channel}"))
            .map(SecretString::from)
            .map_err(|_| NsxbotError::Config(format!("no 360dialog key for channel {channel}")))
    }
}
