// SPDX-FileCopyrightText: 2026 Unidesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./unidesk.toml` > `~/.config/unidesk/unidesk.toml` > `/etc/unidesk/unidesk.toml`
//! with environment variable overrides via `UNIDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::UnideskConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/unidesk/unidesk.toml` (system-wide)
/// 3. `~/.config/unidesk/unidesk.toml` (user XDG config)
/// 4. `./unidesk.toml` (local directory)
/// 5. `UNIDESK_*` environment variables
pub fn load_config() -> Result<UnideskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UnideskConfig::default()))
        .merge(Toml::file("/etc/unidesk/unidesk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("unidesk/unidesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("unidesk.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<UnideskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UnideskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<UnideskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(UnideskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `UNIDESK_GEMINI_API_KEY` must map to
/// `gemini.api_key`, not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("UNIDESK_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: UNIDESK_GEMINI_API_KEY -> "gemini_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("assistant_", "assistant.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
