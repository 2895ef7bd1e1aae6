// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clients for the NSX neural search platform.
//!
//! - [`NsxSearchClient`] ranks passages for a query (neural or BM25).
//! - [`SenseClient`] answers a query from the ranked documents.
//! - [`NsxFaqScorer`] scores a query against FAQ questions.

mod http;
pub mod score;
pub mod search;
pub mod sense;
pub mod types;

pub use score::NsxFaqScorer;
pub use search::NsxSearchClient;
pub use sense::SenseClient;
