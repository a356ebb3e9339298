// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `unidesk stats` command implementation.
//!
//! Prints the same aggregates the dashboard analytics view renders.

use colored::Colorize;

use unidesk_config::UnideskConfig;
use unidesk_core::UnideskError;
use unidesk_core::analytics::{AnalyticsSummary, Slice};
use unidesk_storage::HelpdeskStore;

/// Runs the `unidesk stats` command.
pub async fn run_stats(config: UnideskConfig) -> Result<(), UnideskError> {
    let store = HelpdeskStore::open(&config.storage.database_path).await?;
    let conversations = store.conversations().await?;
    let summary = AnalyticsSummary::from_conversations(&conversations);

    println!("{}", "unidesk stats".bold());
    println!("total queries:  {}", summary.total_queries);
    println!(
        "status:         {} open, {} resolved, {} escalated",
        summary.open,
        summary.resolved.to_string().green(),
        summary.escalated.to_string().red(),
    );
    println!("resolved rate:  {}%", summary.resolved_rate);

    print_distribution("categories", &summary.category_distribution);
    print_distribution("sentiment", &summary.sentiment_distribution);
    print_distribution("platforms", &summary.platform_distribution);

    if !summary.queries_per_day.is_empty() {
        println!("\n{}", "queries per day".bold());
        for day in &summary.queries_per_day {
            println!("  {}  {}", day.date, day.count);
        }
    }

    Ok(())
}

fn print_distribution(title: &str, slices: &[Slice]) {
    if slices.is_empty() {
        return;
    }
    println!("\n{}", title.bold());
    for slice in slices {
        println!("  {:<20} {}", slice.name, slice.value);
    }
}
