// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nsxbot chat` command implementation.
//!
//! Terminal REPL over the same handler the gateway uses. Every reply shows
//! the reasoning trace, the outcome and the latency breakdown.

use std::sync::Arc;

use colored::Colorize;
use nsxbot_agent::Reply;
use nsxbot_config::NsxbotConfig;
use nsxbot_core::NsxbotError;
use nsxbot_core::types::UserKey;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

use crate::wiring::build_handler;

/// Chatbot id recorded for terminal conversations.
const CHATBOT_ID: &str = "terminal";

pub async fn run_chat(
    config: NsxbotConfig,
    index: Option<String>,
    user: String,
) -> Result<(), NsxbotError> {
    let config = Arc::new(config);
    let storage = nsxbot_storage::open_storage(&config.memory).await?;
    let handler = build_handler(config.clone(), &storage)?;
    let user = UserKey::new(user, CHATBOT_ID);
    let mut index = index.unwrap_or_else(|| config.nsx.default_index.clone());
    info!(user_id = %user.user_id, %index, "starting chat session");

    let mut rl = DefaultEditor::new()
        .map_err(|e| NsxbotError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "nsxbot chat".bold().green());
    println!(
        "Index {}. Type {} to switch, {} to forget this conversation, {} to exit.\n",
        index.cyan(),
        "/index <id>".yellow(),
        "/reset".yellow(),
        "/quit".yellow()
    );

    loop {
        let prompt = format!("{}> ", index.green());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                match trimmed {
                    "/quit" | "/exit" => break,
                    "/reset" => {
                        storage.memory.clear(&user, &index).await?;
                        println!("{}", "conversation cleared".dimmed());
                        continue;
                    }
                    _ => {}
                }
                if let Some(next) = trimmed.strip_prefix("/index ") {
                    index = next.trim().to_string();
                    println!("{} {}", "switched to".dimmed(), index.cyan());
                    continue;
                }

                match handler.respond(trimmed, &user, &index).await {
                    Ok(reply) => print_reply(&reply),
                    Err(e) => eprintln!("{} [{}]: {e}", "error".red(), e.code()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }
    Ok(())
}

fn print_reply(reply: &Reply) {
    if !reply.trace.is_empty() {
        println!("{}", reply.trace.trim_end().dimmed());
    }
    println!("{}\n", reply.answer.bold());
    let latency: Vec<String> = reply
        .latency
        .iter()
        .map(|(stage, secs)| format!("{stage}={secs:.2}s"))
        .collect();
    println!(
        "{}",
        format!(
            "[{} | steps {} | tokens {} | {}]",
            reply.outcome,
            reply.steps.len(),
            reply.usage.total_tokens,
            latency.join(" ")
        )
        .dimmed()
    );
}
