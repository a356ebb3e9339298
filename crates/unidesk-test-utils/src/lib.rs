// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Unidesk integration tests.
//!
//! Provides a mock language model and a test harness for fast,
//! deterministic, CI-runnable tests without Gemini API calls.
//!
//! # Components
//!
//! - [`MockModel`] - Mock language model with scripted replies and classifications
//! - [`TestHarness`] - Full helpdesk stack over a temp SQLite database

pub mod harness;
pub mod mock_model;

pub use harness::TestHarness;
pub use mock_model::{MockModel, MockReply, RecordedGenerateCall};
