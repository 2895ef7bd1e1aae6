// SPDX-FileCopyrightText: 2026 nsxbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! nsxbot - WhatsApp assistant answering from NSX search indexes.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod eval;
mod serve;
mod sweep;
mod wiring;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nsxbot_config::NsxbotConfig;

/// nsxbot - WhatsApp assistant answering from NSX search indexes.
#[derive(Parser, Debug)]
#[command(name = "nsxbot", version, about, long_about = None)]
struct Cli {
    /// Configuration file; the XDG hierarchy is searched when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the WhatsApp webhook and the chat API.
    Serve,
    /// Chat with the assistant in the terminal, printing the reasoning trace.
    Chat {
        /// Search index to talk to; defaults to `nsx.default_index`.
        #[arg(long)]
        index: Option<String>,
        /// User id the conversation is remembered under.
        #[arg(long, default_value = "terminal")]
        user: String,
    },
    /// Run the evaluation harness configured by `NSXBOT_EVAL_*`.
    Eval,
    /// Delete expired sessions from the SQLite memory store.
    Sweep,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => nsxbot_config::load_and_validate_path(path),
        None => nsxbot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            nsxbot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Chat { index, user } => chat::run_chat(config, index, user).await,
        Commands::Eval => eval::run_eval(config).await,
        Commands::Sweep => sweep::run_sweep(config).await,
    };

    if let Err(e) = result {
        eprintln!("nsxbot: {e} ({})", e.code());
        std::process::exit(1);
    }
}

fn init_tracing(config: &NsxbotConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("nsxbot={},warn", config.agent.log_level))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
