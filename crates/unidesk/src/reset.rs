// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk reset` command implementation.
//!
//! Clears the store back to its seeded state: default FAQ entries, no
//! conversations.

use colored::Colorize;

use unidesk_config::UnideskConfig;
use unidesk_core::UnideskError;
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk reset` command.
pub async fn run_reset(config: UnideskConfig, yes: bool) -> Result<(), UnideskError> {
    if !yes {
        println!(
            "This deletes every stored conversation and restores the seeded FAQs.\n\
             Re-run with {} to confirm.",
            "--yes".yellow()
        );
        return Ok(());
    }

    let store = HelpdeskStore::open(&config.storage.database_path).await?;
    store.reset().await?;
    println!("store reset to seeded state");
    Ok(())
}
