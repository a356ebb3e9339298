// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Unidesk helpdesk agent.

use thiserror::Error;

/// The primary error type used across all Unidesk crates.
///
/// Input validation never surfaces here: blank queries and blank FAQ
/// fields are silent no-ops at their call sites. Upstream model failures
/// are degraded to documented defaults by the session manager, so in
/// practice only storage and configuration problems propagate.
#[derive(Debug, Error)]
pub enum UnideskError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Language-model gateway errors (API failure, malformed response, timeout).
    #[error("model error: {message}")]
    Model {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl UnideskError {
    /// Wraps an arbitrary error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }

    /// Builds a model error with no underlying source.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause to a model error. No-op for other variants.
    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Self::Model { source, .. } = &mut self {
            *source = Some(Box::new(cause));
        }
        self
    }
}
