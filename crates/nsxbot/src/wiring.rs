// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the chat handler from configuration.

use std::sync::Arc;

use nsxbot_agent::{Adapters, ChatHandler, FaqBook};
use nsxbot_config::NsxbotConfig;
use nsxbot_core::{ModerationAdapter, NsxbotError, SearchAdapter};
use nsxbot_llm::{ModerationClient, PromptAnswererProvider};
use nsxbot_nsx::{NsxFaqScorer, NsxSearchClient, SenseClient};
use nsxbot_storage::Storage;
use tracing::info;

/// Chat handler over the real NSX and completion services and `storage`.
pub fn build_handler(
    config: Arc<NsxbotConfig>,
    storage: &Storage,
) -> Result<ChatHandler, NsxbotError> {
    let features = &config.features;
    let search_client = NsxSearchClient::new(&config.nsx)?;
    let search: Arc<dyn SearchAdapter> = if features.sense {
        Arc::new(SenseClient::new(search_client, &config)?)
    } else {
        Arc::new(search_client)
    };
    let moderation = if features.moderation {
        Some(Arc::new(ModerationClient::new(&config.llm)?) as Arc<dyn ModerationAdapter>)
    } else {
        None
    };
    let faq_book = if features.faq {
        FaqBook::load(&config.faq.directory)?
    } else {
        FaqBook::default()
    };

    info!(
        strategy = %config.agent.strategy,
        search = features.search,
        memory = features.memory,
        faq = features.faq,
        moderation = features.moderation,
        sense = features.sense,
        "chat handler ready"
    );

    let adapters = Adapters {
        completion: Arc::new(PromptAnswererProvider::new(&config.llm)?),
        search,
        faq_scorer: Arc::new(NsxFaqScorer::new(&config)?),
        moderation,
        memory: Some(storage.memory.clone()),
        audit: storage.audit.clone(),
    };
    Ok(ChatHandler::new(config, adapters, Arc::new(faq_book)))
}
