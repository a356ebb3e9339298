// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk faq` command implementation.
//!
//! Lists, adds, and removes knowledge-base entries. Changes take effect on
//! the next exchange: the context block is rebuilt from storage per query.

use std::str::FromStr;
use std::sync::Arc;

use clap::Subcommand;
use colored::Colorize;
use strum::IntoEnumIterator;

use unidesk_config::UnideskConfig;
use unidesk_core::{Category, UnideskError};
use unidesk_kb::KnowledgeBase;
use unidesk_storage::HelpdeskStore;

/// Actions for the `unidesk faq` subcommand.
#[derive(Subcommand, Debug)]
pub enum FaqAction {
    /// List all knowledge-base entries.
    List,
    /// Add an entry.
    Add {
        question: String,
        answer: String,
        /// Category label, e.g. "Admissions" or "Fees & Finance".
        #[arg(long, default_value = "Other")]
        category: String,
    },
    /// Remove the entry with the given id.
    Remove { id: String },
}

/// Runs the `unidesk faq` command.
pub async fn run_faq(config: UnideskConfig, action: FaqAction) -> Result<(), UnideskError> {
    let store = Arc::new(HelpdeskStore::open(&config.storage.database_path).await?);
    let kb = KnowledgeBase::new(store);

    match action {
        FaqAction::List => {
            let faqs = kb.list().await?;
            if faqs.is_empty() {
                println!("{}", "no FAQ entries".dimmed());
                return Ok(());
            }
            for faq in &faqs {
                println!(
                    "{} {} {}",
                    faq.id.dimmed(),
                    format!("[{}]", faq.category).cyan(),
                    faq.question
                );
                println!("  {}", faq.answer.dimmed());
            }
        }
        FaqAction::Add {
            question,
            answer,
            category,
        } => {
            let category = Category::from_str(&category).map_err(|_| {
                let known = Category::iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                UnideskError::Config(format!(
                    "unknown category \"{category}\" (expected one of: {known})"
                ))
            })?;

            match kb.add(&question, &answer, category).await? {
                Some(faq) => println!("added {}", faq.id.green()),
                None => println!("{}", "question and answer must not be blank".yellow()),
            }
        }
        FaqAction::Remove { id } => {
            kb.remove(&id).await?;
            println!("removed {id}");
        }
    }

    Ok(())
}
