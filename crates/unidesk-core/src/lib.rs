// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Unidesk helpdesk agent.
//!
//! This crate provides the shared data model, the central error type,
//! the language-model gateway trait, and dashboard analytics. Everything
//! else in the workspace builds on these definitions.

pub mod analytics;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use analytics::AnalyticsSummary;
pub use error::UnideskError;
pub use traits::{LanguageModel, TextStream};
pub use types::{
    Category, Conversation, Faq, Message, MessageRole, Platform, QueryAnalysis, Sentiment,
    TicketStatus,
};
