// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence gateway for the Unidesk helpdesk agent.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and whole-collection reads/writes
//! for the helpdesk's FAQ and conversation records.

pub mod database;
pub mod kv;
pub mod migrations;
pub mod store;

pub use database::Database;
pub use store::{default_faqs, HelpdeskStore, CONVERSATIONS_COLLECTION, FAQS_COLLECTION};
