// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapters, the reasoning loop and the gateway.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Search,
    FaqScorer,
    Completion,
    Moderation,
    Memory,
    Messenger,
}

// --- Conversation ---

/// Author of a conversation turn or chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Function,
}

/// One entry of a user's conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Renders the turn as a transcript line (`Usuário: ...`, `Assistente: ...`).
    ///
    /// System turns (summaries) are rendered verbatim.
    pub fn render(&self) -> String {
        match self.role {
            Role::User => format!("Usuário: {}", self.content),
            Role::Assistant => format!("Assistente: {}", self.content),
            Role::System | Role::Function => self.content.clone(),
        }
    }
}

/// Renders a whole history as the transcript block embedded in prompts.
pub fn render_transcript(turns: &[ConversationTurn]) -> String {
    let mut out = String::new();
    for turn in turns {
        out.push_str(&turn.render());
        out.push('\n');
    }
    out
}

/// Identifies whose memory is being read: the end user on a given bot number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserKey {
    pub user_id: String,
    pub chatbot_id: String,
}

impl UserKey {
    pub fn new(user_id: impl Into<String>, chatbot_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            chatbot_id: chatbot_id.into(),
        }
    }

    /// Flat storage key, `<user>_<chatbot>`.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.user_id, self.chatbot_id)
    }
}

impl std::fmt::Display for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Everything the memory store knows about one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub key: UserKey,
    pub active_index: Option<String>,
    pub last_interaction: DateTime<Utc>,
    /// Turn history per search index.
    pub histories: BTreeMap<String, Vec<ConversationTurn>>,
}

impl UserSession {
    pub fn new(key: UserKey) -> Self {
        Self {
            key,
            active_index: None,
            last_interaction: Utc::now(),
            histories: BTreeMap::new(),
        }
    }

    /// True when the session has been idle for longer than `ttl_secs` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        let idle = now.signed_duration_since(self.last_interaction);
        idle.num_seconds() > ttl_secs as i64
    }
}

// --- Capabilities and actions ---

/// Feature toggles the reasoning loop runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub search: bool,
    pub memory: bool,
    pub faq: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            search: true,
            memory: true,
            faq: true,
        }
    }
}

impl Capabilities {
    /// Actions the model may emit under these capabilities.
    pub fn permitted_actions(&self) -> Vec<ActionKind> {
        let mut actions = Vec::with_capacity(2);
        if self.search {
            actions.push(ActionKind::Search);
        }
        actions.push(ActionKind::Answer);
        actions
    }

    /// Compact label used in evaluation metadata (`search+faq`).
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if self.search {
            parts.push("search");
        }
        if self.memory {
            parts.push("memory");
        }
        if self.faq {
            parts.push("faq");
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join("+")
        }
    }
}

/// Kind of action a reasoning step can take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Search,
    Answer,
    None,
}

impl ActionKind {
    /// Keyword the Portuguese prompt uses for this action.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Search => "Pesquisar",
            Self::Answer => "Finalizar",
            Self::None => "",
        }
    }
}

// --- Search ---

/// Ranking strategy used by the search backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchStrategy {
    /// Neural reranker over the first-stage candidates.
    #[default]
    Neural,
    /// Lexical ranking only.
    Bm25,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,
    pub query: String,
    pub strategy: SearchStrategy,
    pub max_docs: usize,
}

/// A ranked passage returned by search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            source_url: None,
        }
    }
}

// --- Completion ---

/// A structured call the model asks the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the model produced them.
    pub arguments: String,
}

/// JSON-schema description of a callable capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// One message in a chat-style completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            name: None,
            function_call: None,
        }
    }

    /// Assistant message carrying the call the model made.
    pub fn call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Function result fed back to the model.
    pub fn function_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: Some(content.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }
}

/// A request to the completion service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub functions: Vec<FunctionSchema>,
    pub stop: Vec<String>,
    /// Overrides the configured completion length when set.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Single user-message request, the shape used for raw text prompting.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::text(Role::User, text)],
            ..Default::default()
        }
    }

    pub fn with_stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_functions(mut self, functions: Vec<FunctionSchema>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
        self.total_tokens += rhs.total_tokens;
    }
}

/// What the model decided to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Answer(String),
    Call(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

impl CompletionResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn from_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
            ..Default::default()
        }
    }

    /// Trimmed completion text, empty when the model returned none.
    pub fn text_or_empty(&self) -> String {
        self.text.as_deref().unwrap_or_default().trim().to_string()
    }

    /// A function call wins over text; otherwise the text is the answer.
    pub fn directive(&self) -> Directive {
        match &self.function_call {
            Some(call) => Directive::Call(call.clone()),
            None => Directive::Answer(self.text_or_empty()),
        }
    }
}

// --- Messaging ---

/// One selectable row in an interactive menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Interactive list menu sent to a user to pick a search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub header: String,
    pub body: String,
    pub footer: String,
    pub button: String,
    pub options: Vec<MenuOption>,
}

// --- Audit ---

/// Persisted record of one answered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub user: UserKey,
    pub index: String,
    pub user_message: String,
    pub answer: String,
    pub reasoning: String,
    pub outcome: String,
    /// Seconds spent per stage (`memory_get`, `reasoning`, `total`, ...).
    pub latency: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_renders_portuguese_labels() {
        assert_eq!(ConversationTurn::user("oi").render(), "Usuário: oi");
        assert_eq!(
            ConversationTurn::assistant("olá").render(),
            "Assistente: olá"
        );
        assert_eq!(
            ConversationTurn::system("Resumo: x").render(),
            "Resumo: x"
        );
    }

    #[test]
    fn transcript_is_newline_terminated() {
        let turns = vec![
            ConversationTurn::user("a"),
            ConversationTurn::assistant("b"),
        ];
        assert_eq!(render_transcript(&turns), "Usuário: a\nAssistente: b\n");
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn storage_key_joins_user_and_bot() {
        let key = UserKey::new("5511999", "5511888");
        assert_eq!(key.storage_key(), "5511999_5511888");
        assert_eq!(key.to_string(), "5511999_5511888");
    }

    #[test]
    fn session_expiry_uses_last_interaction() {
        let mut session = UserSession::new(UserKey::new("u", "b"));
        let now = session.last_interaction + chrono::Duration::seconds(10);
        assert!(!session.is_expired(now, 3600));
        session.last_interaction = now - chrono::Duration::seconds(3601);
        assert!(session.is_expired(now, 3600));
    }

    #[test]
    fn disabling_search_removes_search_action() {
        let caps = Capabilities {
            search: false,
            ..Default::default()
        };
        assert_eq!(caps.permitted_actions(), vec![ActionKind::Answer]);
        assert!(
            Capabilities::default()
                .permitted_actions()
                .contains(&ActionKind::Search)
        );
    }

    #[test]
    fn capabilities_label() {
        assert_eq!(Capabilities::default().label(), "search+memory+faq");
        let none = Capabilities {
            search: false,
            memory: false,
            faq: false,
        };
        assert_eq!(none.label(), "none");
    }

    #[test]
    fn directive_prefers_function_call() {
        let mut resp = CompletionResponse::from_text("  resposta ");
        assert_eq!(resp.directive(), Directive::Answer("resposta".into()));
        resp.function_call = Some(FunctionCall {
            name: "f".into(),
            arguments: "{}".into(),
        });
        assert!(matches!(resp.directive(), Directive::Call(c) if c.name == "f"));
    }

    #[test]
    fn chat_message_skips_empty_fields() {
        let msg = ChatMessage::text(Role::User, "oi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "oi"}));

        let msg = ChatMessage::function_result("buscar", "[]");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "function");
        assert_eq!(json["name"], "buscar");
    }

    #[test]
    fn strategy_parses_from_str() {
        use std::str::FromStr;
        assert_eq!(SearchStrategy::from_str("bm25").unwrap(), SearchStrategy::Bm25);
        assert_eq!(SearchStrategy::Neural.to_string(), "neural");
    }
}
