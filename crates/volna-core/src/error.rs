// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Volna publishing pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Volna crates.
#[derive(Debug, Error)]
pub enum VolnaError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue store errors (connection failure, query failure).
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The queue has no items at or after the supplied cursor.
    /// A scheduling signal, not a failure.
    #[error("media queue is empty")]
    EmptyQueue,

    /// No dedup token exists for this media. A cache miss, not a failure.
    #[error("no dedup token for media {media_id}")]
    NoDedupToken { media_id: i64 },

    /// The dedup token could not be decoded into an upload handle.
    #[error("dedup codec: {0}")]
    Codec(String),

    /// Remote endpoint errors (transport failure, rejected request).
    #[error("telegram api: {message}")]
    Api {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Flow-control signal from the endpoint: suspend all requests for `wait`.
    #[error("flood wait of {}s requested by the endpoint", wait.as_secs())]
    FloodWait { wait: Duration },

    /// Accumulated flood waits exceeded the configured bound. Session-fatal.
    #[error("flood waits exhausted: waited {}s of {}s allowed", waited.as_secs(), limit.as_secs())]
    FloodWaitExceeded { waited: Duration, limit: Duration },

    /// A previously issued upload handle is no longer accepted by the
    /// endpoint. Treated like a malformed dedup token: re-upload once.
    #[error("upload handle no longer accepted by the endpoint")]
    HandleExpired,

    /// Authentication failure. Process-fatal, no automatic recovery.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VolnaError {
    /// Wraps an arbitrary error as a store error.
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        VolnaError::Store {
            source: Box::new(source),
        }
    }

    /// Builds an API error from a message, without an underlying source.
    pub fn api(message: impl Into<String>) -> Self {
        VolnaError::Api {
            message: message.into(),
            source: None,
        }
    }

    /// True for conditions the caller absorbs locally rather than propagates.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, VolnaError::NoDedupToken { .. })
    }
}
