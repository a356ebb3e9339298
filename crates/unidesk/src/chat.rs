// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk chat` command implementation.
//!
//! Launches an interactive REPL with colored prompt, streaming output,
//! and readline history. Runs one chat session against the live Gemini
//! gateway; every exchange is persisted like a web conversation.

use std::sync::Arc;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use unidesk_config::UnideskConfig;
use unidesk_core::UnideskError;
use unidesk_gemini::GeminiModel;
use unidesk_kb::KnowledgeBase;
use unidesk_session::{AnswerMode, ChatSession, ExchangeEvent, SessionManager, Submission};
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk chat` interactive REPL.
///
/// Prompts for student queries and streams the answer to stdout as it
/// arrives. The session continues until `/quit`, Ctrl+C, or Ctrl+D.
pub async fn run_chat(config: UnideskConfig) -> Result<(), UnideskError> {
    let store = Arc::new(HelpdeskStore::open(&config.storage.database_path).await?);

    let model = Arc::new(GeminiModel::new(&config).map_err(|e| {
        eprintln!(
            "error: Gemini API key required. Set gemini.api_key in config or the GEMINI_API_KEY environment variable."
        );
        e
    })?);

    let kb = KnowledgeBase::new(store.clone());
    let manager = SessionManager::new(model, store, kb);

    let mut session = ChatSession::new(
        config.assistant.student_id.clone(),
        config.assistant.student_name.clone(),
    );

    let mut rl = DefaultEditor::new()
        .map_err(|e| UnideskError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "unidesk chat".bold().green());
    println!(
        "Ask {} anything about {}. Type {} to exit.\n",
        config.assistant.name,
        config.assistant.university,
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "unidesk".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Err(e) = handle_chat_message(&manager, &mut session, trimmed).await {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    if !session.messages.is_empty() {
        println!(
            "{}",
            format!("conversation saved as {}", session.id).dimmed()
        );
    }
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Streams one exchange to stdout, printing deltas as they arrive.
async fn handle_chat_message(
    manager: &SessionManager,
    session: &mut ChatSession,
    input: &str,
) -> Result<(), UnideskError> {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let ExchangeEvent::AnswerDelta { delta, .. } = event {
                print!("{delta}");
                std::io::Write::flush(&mut std::io::stdout()).ok();
            }
        }
    });

    let outcome = manager
        .submit_query(session, input, AnswerMode::Streaming, Some(tx))
        .await;
    // The event sender is gone once submit_query returns, so the printer
    // drains the remaining deltas and exits.
    let _ = printer.await;
    println!();

    match outcome? {
        Submission::Completed(report) => {
            println!(
                "{}",
                format!(
                    "(category: {}, sentiment: {}, status: {})",
                    report.analysis.category,
                    report.analysis.sentiment,
                    report.conversation.status
                )
                .dimmed()
            );
            if report.generation_degraded || report.classification_degraded {
                eprintln!("{}", "(degraded: a model call failed this turn)".yellow());
            }
        }
        Submission::Ignored(_) => {}
    }

    Ok(())
}
