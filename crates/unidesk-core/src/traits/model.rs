// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language-model gateway trait.
//!
//! The session manager consumes this as an opaque capability: given a
//! query, prior turns, and knowledge-base context, produce text either
//! in one piece or as an ordered stream of deltas. Implementations live
//! in provider crates (unidesk-gemini) and in test doubles.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::UnideskError;
use crate::types::{Message, QueryAnalysis};

/// An ordered, finite, non-restartable stream of text deltas.
///
/// The producer signals completion by ending the stream and failure by
/// yielding exactly one `Err` item; consumers stop at the first `Err`
/// and keep whatever text arrived before it.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, UnideskError>> + Send>>;

/// Opaque generative-language capability.
///
/// Methods return honest `Result`s; the documented fail-closed behavior
/// (apology text, `{Other, Neutral}`) is applied by the session manager
/// so it holds for every implementation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Classifies a single query into category and sentiment.
    async fn classify(&self, query: &str) -> Result<QueryAnalysis, UnideskError>;

    /// Generates a full answer in one call.
    async fn generate(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<String, UnideskError>;

    /// Generates an answer as an ordered stream of text deltas.
    async fn generate_stream(
        &self,
        query: &str,
        history: &[Message],
        context: &str,
    ) -> Result<TextStream, UnideskError>;
}
