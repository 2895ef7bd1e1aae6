// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the nsxbot conversational agent.
//!
//! Holds the error type, the shared data model and the adapter traits that
//! every external system (search, completion, memory, messaging) sits behind.

pub mod error;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::NsxbotError;
pub use tokens::count_tokens;
pub use types::{AdapterType, HealthStatus};

pub use traits::{
    CompletionAdapter, FaqScorer, InteractionLog, MemoryStore, ModerationAdapter,
    OutboundMessenger, PluginAdapter, SearchAdapter, SecretStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Search,
            AdapterType::FaqScorer,
            AdapterType::Completion,
            AdapterType::Moderation,
            AdapterType::Memory,
            AdapterType::Messenger,
        ];
        for variant in &variants {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn all_traits_are_exported() {
        fn _plugin<T: PluginAdapter>() {}
        fn _search<T: SearchAdapter>() {}
        fn _faq<T: FaqScorer>() {}
        fn _completion<T: CompletionAdapter>() {}
        fn _moderation<T: ModerationAdapter>() {}
        fn _memory<T: MemoryStore>() {}
        fn _messenger<T: OutboundMessenger>() {}
        fn _log<T: InteractionLog>() {}
        fn _secrets<T: SecretStore>() {}
    }
}
