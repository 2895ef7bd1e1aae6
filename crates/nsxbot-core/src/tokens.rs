// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting for prompt budgets.

use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;

static ENCODING: LazyLock<Option<CoreBPE>> = LazyLock::new(|| match tiktoken_rs::cl100k_base() {
    Ok(bpe) => Some(bpe),
    Err(e) => {
        tracing::warn!(error = %e, "cl100k_base unavailable, falling back to char estimate");
        None
    }
});

/// Number of `cl100k_base` tokens in `text`.
///
/// Falls back to a four-characters-per-token estimate if the encoder
/// cannot be built.
pub fn count_tokens(text: &str) -> usize {
    match ENCODING.as_ref() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => text.chars().count().div_ceil(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        assert_eq!(count_tokens(""), 0);
    }

    #[test]
    fn longer_text_has_more_tokens() {
        let short = count_tokens("Qual a data da prova?");
        let long = count_tokens(&"Qual a data da prova? ".repeat(20));
        assert!(short > 0);
        assert!(long > short * 10);
    }
}
