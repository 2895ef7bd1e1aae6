// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parser for the model's Thought / Action output.
//!
//! Two action shapes are accepted:
//!
//! ```text
//! Ação 2: Pesquisar
//! Texto da Ação 2: Data da prova
//! ```
//!
//! and the compact bracketed form `Ação 2: Pesquisar[Data da prova]`. An
//! unclosed bracket takes everything after it.

use std::sync::LazyLock;

use nsxbot_core::types::ActionKind;
use regex::Regex;

/// Text between the first `[` and the last `]`, or after the `[` when the
/// model forgot to close it.
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[(.*)\]|\[(.*)").expect("valid regex"));

/// One model turn split at the action marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReasoning {
    pub thought: String,
    /// Everything after `Ação N:`; `None` when the marker is missing.
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAction {
    pub kind: ActionKind,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    MissingAction,
    UnknownAction(String),
    MissingInput,
    Disallowed(ActionKind),
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAction => f.write_str("no action line"),
            Self::UnknownAction(a) => write!(f, "unknown action `{a}`"),
            Self::MissingInput => f.write_str("action has no input text"),
            Self::Disallowed(kind) => write!(f, "action `{}` is not permitted", kind.keyword()),
        }
    }
}

/// Splits the completion for `Pensamento {step}:` into thought and action.
pub fn split_reasoning(raw: &str, step: usize) -> RawReasoning {
    let marker = format!("\nAção {step}:");
    match raw.split_once(&marker) {
        Some((thought, action)) => RawReasoning {
            thought: thought.trim().to_string(),
            action: Some(action.to_string()),
        },
        None => RawReasoning {
            thought: raw.trim().lines().next().unwrap_or_default().trim().to_string(),
            action: None,
        },
    }
}

/// Parses the text after `Ação {step}:` and checks it against `permitted`.
pub fn parse_action(
    action: &str,
    step: usize,
    permitted: &[ActionKind],
) -> Result<ParsedAction, ParseFailure> {
    let trimmed = action.trim_start();
    let keyword: String = trimmed
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();
    let kind = match keyword.to_lowercase().as_str() {
        "pesquisar" => ActionKind::Search,
        "finalizar" => ActionKind::Answer,
        "" => return Err(ParseFailure::MissingAction),
        _ => return Err(ParseFailure::UnknownAction(keyword)),
    };
    if !permitted.contains(&kind) {
        return Err(ParseFailure::Disallowed(kind));
    }

    let input = action_input(&trimmed[keyword.len()..], step).ok_or(ParseFailure::MissingInput)?;
    Ok(ParsedAction { kind, input })
}

fn action_input(rest: &str, step: usize) -> Option<String> {
    let text_marker = format!("Texto da Ação {step}:");
    let input = if let Some((_, after)) = rest.split_once(&text_marker) {
        after.trim().to_string()
    } else if let Some(caps) = BRACKETED.captures(rest) {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().to_string())?
    } else {
        return None;
    };
    (!input.is_empty()).then_some(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ActionKind] = &[ActionKind::Search, ActionKind::Answer];

    #[test]
    fn splits_thought_from_action() {
        let raw = " Preciso pesquisar a data.\nAção 1: Pesquisar\nTexto da Ação 1: Data da prova";
        let parsed = split_reasoning(raw, 1);
        assert_eq!(parsed.thought, "Preciso pesquisar a data.");
        assert_eq!(
            parsed.action.as_deref(),
            Some(" Pesquisar\nTexto da Ação 1: Data da prova")
        );
    }

    #[test]
    fn missing_marker_keeps_first_line_as_thought() {
        let parsed = split_reasoning(" Vou pensar.\nOutra linha", 3);
        assert_eq!(parsed.thought, "Vou pensar.");
        assert!(parsed.action.is_none());
    }

    #[test]
    fn marker_for_other_step_is_not_an_action() {
        assert!(split_reasoning("x\nAção 2: Finalizar[y]", 1).action.is_none());
    }

    #[test]
    fn parses_text_line_form() {
        let action = parse_action(" Pesquisar\nTexto da Ação 1: Data da prova\n", 1, ALL).unwrap();
        assert_eq!(action.kind, ActionKind::Search);
        assert_eq!(action.input, "Data da prova");
    }

    #[test]
    fn parses_bracketed_form() {
        let action = parse_action(" Finalizar[A prova é dia 25/03.]", 2, ALL).unwrap();
        assert_eq!(action.kind, ActionKind::Answer);
        assert_eq!(action.input, "A prova é dia 25/03.");
    }

    #[test]
    fn unclosed_bracket_takes_the_rest() {
        let action = parse_action(" Finalizar[Olá, Bob! Como posso ajudar?", 1, ALL).unwrap();
        assert_eq!(action.input, "Olá, Bob! Como posso ajudar?");
    }

    #[test]
    fn quotes_inside_unclosed_bracket_are_kept() {
        let action = parse_action(" Finalizar[Olá, it's fine", 1, ALL).unwrap();
        assert_eq!(action.input, "Olá, it's fine");
        let action = parse_action(r#" Pesquisar["data" da prova]"#, 1, ALL).unwrap();
        assert_eq!(action.input, r#""data" da prova"#);
    }

    #[test]
    fn multiline_answer_is_kept_whole() {
        let action = parse_action(
            " Finalizar\nTexto da Ação 1: Linha um.\nLinha dois.",
            1,
            ALL,
        )
        .unwrap();
        assert_eq!(action.input, "Linha um.\nLinha dois.");
    }

    #[test]
    fn unknown_keyword_fails() {
        assert_eq!(
            parse_action(" Responder[oi]", 1, ALL),
            Err(ParseFailure::UnknownAction("Responder".into()))
        );
    }

    #[test]
    fn keyword_without_input_fails() {
        assert_eq!(parse_action(" Pesquisar", 1, ALL), Err(ParseFailure::MissingInput));
        assert_eq!(parse_action(" Pesquisar[]", 1, ALL), Err(ParseFailure::MissingInput));
    }

    #[test]
    fn empty_action_fails() {
        assert_eq!(parse_action("   ", 1, ALL), Err(ParseFailure::MissingAction));
    }

    #[test]
    fn search_is_rejected_when_not_permitted() {
        assert_eq!(
            parse_action(" Pesquisar[data]", 1, &[ActionKind::Answer]),
            Err(ParseFailure::Disallowed(ActionKind::Search))
        );
    }
}
