// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for external collaborators.

pub mod model;

pub use model::{LanguageModel, TextStream};
