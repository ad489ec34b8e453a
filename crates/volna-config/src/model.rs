// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Volna.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Volna configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections default to sensible values; only the
/// Telegram credentials have no usable default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VolnaConfig {
    /// Drain-service settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram endpoint settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Drain-service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Number of queue items fetched per poll; also the channel capacity.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Seconds between queue polls when the queue is empty or errored.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds of empty-channel idle time before a session closes itself.
    #[serde(default = "default_idle_window_secs")]
    pub idle_window_secs: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Config slug used for publish-time bookkeeping.
    #[serde(default = "default_slug")]
    pub slug: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            poll_interval_secs: default_poll_interval_secs(),
            idle_window_secs: default_idle_window_secs(),
            log_level: default_log_level(),
            slug: default_slug(),
        }
    }
}

impl ServerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn idle_window(&self) -> Duration {
        Duration::from_secs(self.idle_window_secs)
    }
}

fn default_page_size() -> u32 {
    20
}

fn default_poll_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_idle_window_secs() -> u64 {
    900 // 15 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_slug() -> String {
    "volna".to_string()
}

/// Telegram endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. `None` makes every remote command fail fast.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat id of the target group.
    #[serde(default)]
    pub group_id: i64,

    /// Parallelism for chunked transfer of a single file.
    #[serde(default = "default_upload_threads")]
    pub upload_threads: usize,

    /// Minimum spacing between outgoing requests, in milliseconds.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Upper bound on flood waits accumulated over a session's lifetime;
    /// exceeding it ends the session.
    #[serde(default = "default_max_flood_wait_secs")]
    pub max_flood_wait_secs: u64,

    /// Performer attribute attached to published audio.
    #[serde(default)]
    pub performer: Option<String>,

    /// Bot API base URL. Overridden in tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            group_id: 0,
            upload_threads: default_upload_threads(),
            rate_limit_ms: default_rate_limit_ms(),
            max_flood_wait_secs: default_max_flood_wait_secs(),
            performer: None,
            api_base: default_api_base(),
        }
    }
}

impl TelegramConfig {
    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn max_flood_wait(&self) -> Duration {
        Duration::from_secs(self.max_flood_wait_secs)
    }
}

fn default_upload_threads() -> usize {
    2
}

fn default_rate_limit_ms() -> u64 {
    1000
}

fn default_max_flood_wait_secs() -> u64 {
    3600 // 1 hour
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Base directory holding media files referenced by relative queue paths.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            media_dir: default_media_dir(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("volna").join("volna.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("volna.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_media_dir() -> String {
    "media".to_string()
}
