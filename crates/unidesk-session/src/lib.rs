// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session management for Unidesk.
//!
//! This crate is the heart of the helpdesk: it accepts student queries,
//! grounds the model in knowledge-base context and prior turns, streams
//! or returns the answer, classifies the query alongside, and persists
//! the merged conversation record exactly once per exchange.

pub mod manager;
pub mod metrics;
pub mod session;

pub use manager::{
    AnswerMode, ExchangeEvent, ExchangeReport, FALLBACK_ANSWER, IgnoreReason, SessionManager,
    Submission,
};
pub use session::ChatSession;
