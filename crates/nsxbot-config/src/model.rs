// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the nsxbot agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use nsxbot_core::types::{Capabilities, SearchStrategy};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level nsxbot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to the values
/// the production bot runs with.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NsxbotConfig {
    /// Agent identity and user-facing canned messages.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Reasoning loop bounds and token budgets.
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Capability toggles.
    #[serde(default)]
    pub features: FeaturesConfig,

    /// Prompt answerer (completion + moderation) settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// NSX search backend settings.
    #[serde(default)]
    pub nsx: NsxConfig,

    /// FAQ book settings.
    #[serde(default)]
    pub faq: FaqConfig,

    /// Conversation memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Webhook server and 360dialog settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// 360dialog API keys keyed by business number.
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,

    /// Search indexes users can pick from.
    #[serde(default)]
    pub indexes: Vec<IndexConfig>,
}

impl NsxbotConfig {
    /// Looks up a configured index by id.
    pub fn index(&self, id: &str) -> Option<&IndexConfig> {
        self.indexes.iter().find(|i| i.id == id)
    }

    /// Domain description used in prompts; falls back to the index id.
    pub fn domain_for(&self, index: &str) -> String {
        self.index(index)
            .map(|i| i.domain.clone())
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| index.to_string())
    }
}

/// Reasoning strategy the chat handler drives.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    /// Textual Thought / Action / Observation loop.
    #[default]
    React,
    /// Structured function calling with parallel searches.
    FunctionCall,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prompt language. Only `pt` ships prompts today.
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub strategy: StrategyKind,

    /// Overall deadline for answering one message.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Reply when the loop fails or runs out of steps.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Reply when the message does not fit the prompt budget.
    #[serde(default = "default_too_long_message")]
    pub too_long_message: String,

    /// Reply when moderation flags the message or the answer.
    #[serde(default = "default_harmful_message")]
    pub harmful_message: String,

    /// Append the reasoning trace to every reply.
    #[serde(default)]
    pub return_debug: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            language: default_language(),
            strategy: StrategyKind::default(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_message: default_fallback_message(),
            too_long_message: default_too_long_message(),
            harmful_message: default_harmful_message(),
            return_debug: false,
        }
    }
}

fn default_agent_name() -> String {
    "nsxbot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "pt".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_fallback_message() -> String {
    "Desculpe, não consegui encontrar uma resposta para a sua mensagem. Por favor, tente reformulá-la."
        .to_string()
}

fn default_too_long_message() -> String {
    "Sua mensagem é muito longa para que eu consiga processá-la adequadamente. Por favor, escreva-a de modo mais conciso."
        .to_string()
}

fn default_harmful_message() -> String {
    "Mensagem ignorada por conter conteúdo ofensivo.".to_string()
}

/// Reasoning loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReasoningConfig {
    /// Maximum Thought/Action cycles before the loop fails.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Token ceiling for the full reasoning prompt.
    #[serde(default = "default_max_tokens_prompt")]
    pub max_tokens_prompt: usize,

    /// Completion length for function-calling requests.
    #[serde(default = "default_max_tokens_function_call")]
    pub max_tokens_function_call: u32,

    /// Concurrent searches in the function-calling strategy.
    #[serde(default = "default_parallel_observations")]
    pub parallel_observations: usize,

    /// Passages joined into one search observation.
    #[serde(default = "default_num_docs")]
    pub num_docs: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_tokens_prompt: default_max_tokens_prompt(),
            max_tokens_function_call: default_max_tokens_function_call(),
            parallel_observations: default_parallel_observations(),
            num_docs: default_num_docs(),
        }
    }
}

fn default_max_steps() -> usize {
    6
}

fn default_max_tokens_prompt() -> usize {
    4000
}

fn default_max_tokens_function_call() -> u32 {
    512
}

fn default_parallel_observations() -> usize {
    4
}

fn default_num_docs() -> usize {
    1
}

/// Capability toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FeaturesConfig {
    #[serde(default = "default_true")]
    pub search: bool,

    #[serde(default = "default_true")]
    pub memory: bool,

    #[serde(default = "default_true")]
    pub faq: bool,

    /// Run user messages and answers through the moderation service.
    #[serde(default = "default_true")]
    pub moderation: bool,

    /// Use the answer-synthesizing Sense endpoint instead of raw passages.
    #[serde(default)]
    pub sense: bool,

    /// Rank with BM25 only, skipping the neural reranker.
    #[serde(default)]
    pub bm25_only: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            search: true,
            memory: true,
            faq: true,
            moderation: true,
            sense: false,
            bm25_only: false,
        }
    }
}

impl FeaturesConfig {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            search: self.search,
            memory: self.memory,
            faq: self.faq,
        }
    }

    pub fn strategy(&self) -> SearchStrategy {
        if self.bm25_only {
            SearchStrategy::Bm25
        } else {
            SearchStrategy::Neural
        }
    }
}

fn default_true() -> bool {
    true
}

/// Prompt answerer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    #[serde(default = "default_completion_endpoint")]
    pub completion_endpoint: String,

    #[serde(default = "default_moderation_endpoint")]
    pub moderation_endpoint: String,

    /// Model name forwarded to the prompt answerer.
    #[serde(default = "default_model")]
    pub model: String,

    /// Caller identifier sent in every request body.
    #[serde(default = "default_service")]
    pub service: String,

    /// Completion length for text prompts.
    #[serde(default = "default_completion_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a request times out.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            completion_endpoint: default_completion_endpoint(),
            moderation_endpoint: default_moderation_endpoint(),
            model: default_model(),
            service: default_service(),
            max_tokens: default_completion_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_completion_endpoint() -> String {
    "http://localhost:7000/api/openai/completions".to_string()
}

fn default_moderation_endpoint() -> String {
    "http://localhost:7000/api/openai/moderations".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo-azure".to_string()
}

fn default_service() -> String {
    "ChatBot".to_string()
}

fn default_completion_max_tokens() -> u32 {
    512
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

/// NSX search backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NsxConfig {
    /// NSX API key. `None` requires `NSXBOT_NSX_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,

    #[serde(default = "default_score_endpoint")]
    pub score_endpoint: String,

    #[serde(default = "default_sense_endpoint")]
    pub sense_endpoint: String,

    /// Documents requested per search.
    #[serde(default = "default_max_docs_to_return")]
    pub max_docs_to_return: usize,

    #[serde(default = "default_nsx_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a request times out.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Index used when a request does not name one.
    #[serde(default = "default_index")]
    pub default_index: String,
}

impl Default for NsxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            search_endpoint: default_search_endpoint(),
            score_endpoint: default_score_endpoint(),
            sense_endpoint: default_sense_endpoint(),
            max_docs_to_return: default_max_docs_to_return(),
            timeout_secs: default_nsx_timeout_secs(),
            max_retries: default_max_retries(),
            default_index: default_index(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://nsx.ai/api/search".to_string()
}

fn default_score_endpoint() -> String {
    "https://nsx.ai/api/inference/score".to_string()
}

fn default_sense_endpoint() -> String {
    "https://nsx.ai/api/multidocqa".to_string()
}

fn default_max_docs_to_return() -> usize {
    5
}

fn default_nsx_timeout_secs() -> u64 {
    20
}

fn default_index() -> String {
    "FUNDEP_Ciencias".to_string()
}

/// FAQ book configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FaqConfig {
    /// Directory holding one `<index>.json` question-to-answer map per index.
    #[serde(default = "default_faq_directory")]
    pub directory: String,

    /// Top-scored questions offered to the model for selection.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,

    /// Token ceiling for the FAQ selection prompt.
    #[serde(default = "default_max_tokens_faq_prompt")]
    pub max_tokens_prompt: usize,

    /// Score at or above which a question answers the message directly.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for FaqConfig {
    fn default() -> Self {
        Self {
            directory: default_faq_directory(),
            max_questions: default_max_questions(),
            max_tokens_prompt: default_max_tokens_faq_prompt(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

fn default_faq_directory() -> String {
    "faqs".to_string()
}

fn default_max_questions() -> usize {
    5
}

fn default_max_tokens_faq_prompt() -> usize {
    3700
}

fn default_confidence_threshold() -> f32 {
    0.9
}

/// Memory backend selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemoryBackend {
    /// Process-local, lost on restart.
    Memory,
    #[default]
    Sqlite,
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: MemoryBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Seconds of inactivity after which a session is dropped.
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,

    /// History size that triggers summarization.
    #[serde(default = "default_max_tokens_history")]
    pub max_tokens_history: usize,

    /// How often `serve` purges expired sessions.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::default(),
            database_path: default_database_path(),
            expiration_secs: default_expiration_secs(),
            max_tokens_history: default_max_tokens_history(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("nsxbot").join("nsxbot.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "nsxbot.db".to_string())
}

fn default_expiration_secs() -> u64 {
    3600
}

fn default_max_tokens_history() -> usize {
    1500
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Webhook server and 360dialog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// 360dialog message endpoint.
    #[serde(default = "default_text_url")]
    pub text_url: String,

    /// Body of the index selection menu.
    #[serde(default = "default_menu_message")]
    pub menu_message: String,

    /// Label of the button that opens the menu (at most 20 characters).
    #[serde(default = "default_menu_button")]
    pub menu_button: String,

    /// Footer telling users how to reopen the menu.
    #[serde(default = "default_menu_footer")]
    pub menu_footer: String,

    /// Message that reopens the menu. Must start with `#`.
    #[serde(default = "default_menu_command")]
    pub menu_command: String,

    /// Sent after a user picks an index that has no intro of its own.
    #[serde(default = "default_intro_message")]
    pub default_intro_message: String,

    /// Reply when processing fails; `{code}` is replaced by the error code.
    #[serde(default = "default_error_message")]
    pub error_message: String,

    /// Outbound text bodies are cut to this many characters.
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            text_url: default_text_url(),
            menu_message: default_menu_message(),
            menu_button: default_menu_button(),
            menu_footer: default_menu_footer(),
            menu_command: default_menu_command(),
            default_intro_message: default_intro_message(),
            error_message: default_error_message(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_text_url() -> String {
    "https://waba.360dialog.io/v1/messages".to_string()
}

fn default_menu_message() -> String {
    "Olá. Escolha um dos itens abaixo para iniciar a conversa.".to_string()
}

fn default_menu_button() -> String {
    "Selecione um item".to_string()
}

fn default_menu_footer() -> String {
    "Para selecionar outro item futuramente, envie #menu".to_string()
}

fn default_menu_command() -> String {
    "#menu".to_string()
}

fn default_intro_message() -> String {
    "Olá! Sou um assistente virtual. Como posso te ajudar?".to_string()
}

fn default_error_message() -> String {
    "Desculpe, ocorreu um erro no processamento da sua mensagem. Por favor, tente novamente mais tarde.\nErro {code}."
        .to_string()
}

fn default_max_message_chars() -> usize {
    4096
}

/// One search index users can talk to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// NSX index name.
    pub id: String,

    /// Menu row title.
    #[serde(default)]
    pub label: String,

    /// Domain description inserted into prompts.
    #[serde(default)]
    pub domain: String,

    /// Greeting sent when the index is selected.
    #[serde(default)]
    pub intro_message: Option<String>,

    /// Sent right after the intro, if set.
    #[serde(default)]
    pub disclaimer: Option<String>,

    /// NSX key for this index, overriding `nsx.api_key`.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_falls_back_to_index_id() {
        let mut config = NsxbotConfig::default();
        assert_eq!(config.domain_for("FUNDEP_Ciencias"), "FUNDEP_Ciencias");
        config.indexes.push(IndexConfig {
            id: "FUNDEP_Ciencias".into(),
            label: "Ciências".into(),
            domain: "vestibular da Fundep".into(),
            intro_message: None,
            disclaimer: None,
            api_key: None,
        });
        assert_eq!(config.domain_for("FUNDEP_Ciencias"), "vestibular da Fundep");
    }

    #[test]
    fn bm25_flag_selects_strategy() {
        let mut features = FeaturesConfig::default();
        assert_eq!(features.strategy(), SearchStrategy::Neural);
        features.bm25_only = true;
        assert_eq!(features.strategy(), SearchStrategy::Bm25);
    }

    #[test]
    fn strategy_kind_deserializes_snake_case() {
        let config: NsxbotConfig = toml::from_str("[agent]\nstrategy = \"function_call\"\n").unwrap();
        assert_eq!(config.agent.strategy, StrategyKind::FunctionCall);
    }
}
