// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Volna publishing pipeline.
//!
//! Provides the error type, domain types, the credential cache, and the
//! consumed-interface traits implemented by the storage and transport crates.

pub mod cache;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::CredentialCache;
pub use error::VolnaError;
pub use traits::{QueueStore, TelegramApi};
pub use types::{MediaItem, MessageId, SendMediaRequest, Topic, UploadHandle};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _ = VolnaError::Config("bad".into());
        let _ = VolnaError::store(std::io::Error::other("down"));
        let _ = VolnaError::EmptyQueue;
        let _ = VolnaError::NoDedupToken { media_id: 1 };
        let _ = VolnaError::Codec("truncated".into());
        let _ = VolnaError::api("rejected");
        let _ = VolnaError::FloodWait {
            wait: std::time::Duration::from_secs(30),
        };
        let _ = VolnaError::FloodWaitExceeded {
            waited: std::time::Duration::from_secs(3700),
            limit: std::time::Duration::from_secs(3600),
        };
        let _ = VolnaError::HandleExpired;
        let _ = VolnaError::Auth("bad token".into());
        let _ = VolnaError::Internal("oops".into());
    }

    #[test]
    fn cache_miss_classification() {
        assert!(VolnaError::NoDedupToken { media_id: 9 }.is_cache_miss());
        assert!(!VolnaError::EmptyQueue.is_cache_miss());
    }
}
