// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./volna.toml` > `~/.config/volna/volna.toml` >
//! `/etc/volna/volna.toml` with environment variable overrides via the
//! `VOLNA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VolnaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/volna/volna.toml` (system-wide)
/// 3. `~/.config/volna/volna.toml` (user XDG config)
/// 4. `./volna.toml` (local directory)
/// 5. `VOLNA_*` environment variables
pub fn load_config() -> Result<VolnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VolnaConfig::default()))
        .merge(Toml::file("/etc/volna/volna.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("volna/volna.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("volna.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<VolnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VolnaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VolnaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VolnaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `VOLNA_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("VOLNA_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
