// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote publish service interface.
//!
//! The wire protocol (handshake, transport encryption, message framing) is
//! an external collaborator's concern; the pipeline only needs these
//! capabilities. Implementations signal flow control by returning
//! [`VolnaError::FloodWait`] and handle expiry with
//! [`VolnaError::HandleExpired`].

use std::path::Path;

use async_trait::async_trait;

use crate::cache::CredentialCache;
use crate::error::VolnaError;
use crate::types::{MessageId, SendMediaRequest, UploadHandle};

#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Establishes or resumes an authenticated session for the bot.
    ///
    /// `cache` holds the last-known credential blob across session restarts;
    /// implementations should consult it before performing a full handshake
    /// and store the refreshed credential after one.
    async fn authenticate(
        &self,
        cache: &CredentialCache,
        bot_token: &str,
    ) -> Result<(), VolnaError>;

    /// Uploads a local file, returning a reusable handle.
    ///
    /// `threads` is the parallelism for chunked transfer of a single file;
    /// transports without chunked upload may ignore it.
    async fn upload_file(&self, path: &Path, threads: usize)
        -> Result<UploadHandle, VolnaError>;

    /// Sends a media message to a forum thread.
    async fn send_media(&self, req: &SendMediaRequest) -> Result<MessageId, VolnaError>;

    /// Creates a forum topic in the target group, returning its thread id.
    async fn create_forum_topic(
        &self,
        name: &str,
        icon_custom_emoji_id: Option<&str>,
    ) -> Result<i64, VolnaError>;
}
