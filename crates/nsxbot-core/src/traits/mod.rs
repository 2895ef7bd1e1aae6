// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Every external system the agent talks to sits behind one of these traits,
//! so the reasoning loop can be driven by real clients or by test mocks.

pub mod adapter;
pub mod completion;
pub mod memory;
pub mod messenger;
pub mod search;

pub use adapter::PluginAdapter;
pub use completion::{CompletionAdapter, ModerationAdapter};
pub use memory::{InteractionLog, MemoryStore};
pub use messenger::{OutboundMessenger, SecretStore};
pub use search::{FaqScorer, SearchAdapter};
