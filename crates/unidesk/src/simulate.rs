// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk simulate` command implementation.
//!
//! Fabricates one inbound webhook from a messaging channel, runs the full
//! exchange, and prints the integration display log the way the dashboard
//! renders it.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use unidesk_config::UnideskConfig;
use unidesk_core::{Platform, UnideskError};
use unidesk_gemini::GeminiModel;
use unidesk_kb::KnowledgeBase;
use unidesk_session::SessionManager;
use unidesk_simulator::{LogEntry, WebhookSimulator};
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk simulate` command.
pub async fn run_simulate(
    config: UnideskConfig,
    platform: &str,
    message: &str,
) -> Result<(), UnideskError> {
    let platform = Platform::from_str(platform).map_err(|_| {
        UnideskError::Config(format!(
            "unknown platform \"{platform}\" (expected whatsapp or facebook)"
        ))
    })?;

    let store = Arc::new(HelpdeskStore::open(&config.storage.database_path).await?);

    let model = Arc::new(GeminiModel::new(&config).map_err(|e| {
        eprintln!(
            "error: Gemini API key required. Set gemini.api_key in config or the GEMINI_API_KEY environment variable."
        );
        e
    })?);

    let kb = KnowledgeBase::new(store.clone());
    let manager = SessionManager::new(model, store, kb);
    // One-shot output prints after the exchange settles; no display pacing.
    let simulator = WebhookSimulator::new(manager).with_log_delay(Duration::ZERO);

    let Some(delivery) = simulator.simulate(platform, message).await? else {
        println!("{}", "message was blank, nothing sent".yellow());
        return Ok(());
    };

    print_log_entry(&delivery.incoming);
    print_log_entry(&delivery.outgoing);
    println!(
        "{}",
        format!(
            "conversation {} persisted with status {}",
            delivery.conversation.id, delivery.conversation.status
        )
        .dimmed()
    );

    Ok(())
}

fn print_log_entry(entry: &LogEntry) {
    println!(
        "{} {} {}",
        format!("[{}]", entry.time).dimmed(),
        entry.direction.to_string().cyan(),
        entry.text
    );
}
