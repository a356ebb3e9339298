// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk history` command implementation.
//!
//! Lists stored conversations newest-first, or prints one full transcript.

use std::sync::Arc;

use colored::Colorize;

use unidesk_config::UnideskConfig;
use unidesk_core::{Conversation, MessageRole, TicketStatus, UnideskError};
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk history` command.
pub async fn run_history(config: UnideskConfig, id: Option<&str>) -> Result<(), UnideskError> {
    let store = HelpdeskStore::open(&config.storage.database_path).await?;
    let store = Arc::new(store);

    match id {
        Some(id) => match store.conversation(id).await? {
            Some(conversation) => print_transcript(&conversation),
            None => println!("{}", format!("no conversation {id}").yellow()),
        },
        None => {
            let conversations = store.conversations().await?;
            if conversations.is_empty() {
                println!("{}", "no conversations yet".dimmed());
                return Ok(());
            }
            for conversation in &conversations {
                print_summary(conversation);
            }
        }
    }

    Ok(())
}

fn print_summary(conversation: &Conversation) {
    let status = status_label(conversation.status);
    println!(
        "{} {:<8} {} {} {} {}",
        conversation.id.dimmed(),
        conversation.platform.to_string().cyan(),
        status,
        conversation.category,
        format!("({} messages)", conversation.messages.len()).dimmed(),
        last_activity_label(conversation.last_activity).dimmed(),
    );
}

fn print_transcript(conversation: &Conversation) {
    println!(
        "{} with {} on {} {}",
        conversation.id.bold(),
        conversation.student_name,
        conversation.platform.to_string().cyan(),
        status_label(conversation.status),
    );
    println!(
        "{}",
        format!(
            "category: {}, sentiment: {}",
            conversation.category, conversation.sentiment
        )
        .dimmed()
    );
    for message in &conversation.messages {
        let speaker = match message.role {
            MessageRole::User => "student".green(),
            MessageRole::Bot => "bot".blue(),
        };
        println!("{speaker}> {}", message.text);
    }
}

fn status_label(status: TicketStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        TicketStatus::Open => label.normal(),
        TicketStatus::Resolved => label.green(),
        TicketStatus::Escalated => label.red(),
    }
}

fn last_activity_label(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
