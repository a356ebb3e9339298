// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unidesk - University helpdesk agent.
//!
//! This is the binary entry point for the Unidesk helpdesk.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod chat;
mod faq;
mod history;
mod reset;
mod serve;
mod simulate;
mod stats;

/// Unidesk - University helpdesk agent.
#[derive(Parser, Debug)]
#[command(name = "unidesk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the helpdesk HTTP gateway.
    Serve,
    /// Launch an interactive chat session.
    Chat,
    /// Fabricate an inbound webhook from a messaging channel.
    Simulate {
        /// Channel to simulate: whatsapp or facebook.
        #[arg(long)]
        platform: String,
        /// The student's message text.
        message: String,
    },
    /// Manage the FAQ knowledge base.
    Faq {
        #[command(subcommand)]
        action: faq::FaqAction,
    },
    /// Browse stored conversations.
    History {
        /// Conversation id to print in full. Lists all when omitted.
        id: Option<String>,
    },
    /// Show dashboard analytics for stored conversations.
    Stats,
    /// Delete all conversations and restore the seeded FAQs.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match unidesk_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            unidesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Chat) => chat::run_chat(config).await,
        Some(Commands::Simulate { platform, message }) => {
            simulate::run_simulate(config, &platform, &message).await
        }
        Some(Commands::Faq { action }) => faq::run_faq(config, action).await,
        Some(Commands::History { id }) => history::run_history(config, id.as_deref()).await,
        Some(Commands::Stats) => stats::run_stats(config).await,
        Some(Commands::Reset { yes }) => reset::run_reset(config, yes).await,
        None => {
            println!("unidesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
