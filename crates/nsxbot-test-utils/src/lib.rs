// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for nsxbot integration tests.
//!
//! Mock adapters and a harness that wires them into a [`ChatHandler`]
//! for fast, deterministic tests without NSX, the completion service or
//! 360dialog.
//!
//! # Components
//!
//! - [`MockCompletion`] - scripted completion service that records requests
//! - [`MockSearch`], [`MockFaqScorer`], [`MockModeration`] - NSX and moderation stand-ins
//! - [`MockMessenger`] - captures outbound WhatsApp messages
//! - [`TestHarness`] - handler assembled from the mocks
//!
//! [`ChatHandler`]: nsxbot_agent::ChatHandler

pub mod harness;
pub mod mock_completion;
pub mod mock_messenger;
pub mod mock_search;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_completion::MockCompletion;
pub use mock_messenger::{MockMessenger, Sent, StaticSecrets};
pub use mock_search::{MockFaqScorer, MockModeration, MockSearch};
