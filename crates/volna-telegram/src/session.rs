// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One authenticated publish session.
//!
//! A session owns a single authenticated connection for its lifetime and
//! publishes items strictly sequentially. The supervisor decides when a
//! session starts and handles the store side (removal, token persistence,
//! failure records); the session handles the remote side (decode-or-upload,
//! send, flow control).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use volna_core::{
    CredentialCache, MediaItem, SendMediaRequest, TelegramApi, UploadHandle, VolnaError,
};

use crate::codec;
use crate::throttle::{FloodBudget, RateGate};

/// Knobs a session needs from the application configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base directory for relative media paths.
    pub media_dir: PathBuf,
    /// Parallelism for chunked upload of a single file.
    pub upload_threads: usize,
    /// Minimum spacing between consecutive API calls.
    pub rate_limit: Duration,
    /// Ceiling on accumulated flood waits for the whole session.
    pub max_flood_wait: Duration,
    /// Performer name attached to sent audio, if configured.
    pub performer: Option<String>,
}

/// A live authenticated session against the remote endpoint.
pub struct PublishSession<C: TelegramApi> {
    api: Arc<C>,
    config: SessionConfig,
    gate: RateGate,
    budget: FloodBudget,
}

impl<C: TelegramApi> PublishSession<C> {
    /// Authenticates and returns a ready session.
    ///
    /// `cache` carries the credential blob across session restarts so a
    /// restarted session can skip the full handshake.
    pub async fn connect(
        api: Arc<C>,
        cache: &CredentialCache,
        bot_token: &str,
        config: SessionConfig,
    ) -> Result<Self, VolnaError> {
        api.authenticate(cache, bot_token).await?;
        let gate = RateGate::new(config.rate_limit);
        let budget = FloodBudget::new(config.max_flood_wait);
        Ok(Self {
            api,
            config,
            gate,
            budget,
        })
    }

    /// Publishes one item, deduplicating the binary upload via `token`.
    ///
    /// A decode failure of the stored token is a warning, not an error: the
    /// item falls through to a fresh upload. A send rejected because the
    /// cached handle expired triggers exactly one re-upload + re-send cycle.
    /// Returns the encoded token for the handle that was actually sent, for
    /// the caller to persist.
    pub async fn publish(
        &mut self,
        item: &MediaItem,
        token: Option<&str>,
    ) -> Result<String, VolnaError> {
        let decoded = token.and_then(|t| match codec::decode(t) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(
                    media_id = item.media_id,
                    error = %e,
                    "stored dedup token is unreadable, re-uploading"
                );
                None
            }
        });

        let reused = decoded.is_some();
        let handle = match decoded {
            Some(handle) => handle,
            None => self.upload(item).await?,
        };

        let mut req = SendMediaRequest {
            message_thread_id: item.message_thread_id,
            handle,
            caption: format!("{}\n{}", item.title, item.hashtag()),
            file_name: item.file_name(),
            title: item.title.clone(),
            performer: self.config.performer.clone(),
            duration_secs: item.duration_secs,
        };

        let mut retried_upload = false;
        let message_id = loop {
            self.gate.acquire().await;
            match self.api.send_media(&req).await {
                Ok(id) => break id,
                Err(VolnaError::FloodWait { wait }) => self.suspend(wait).await?,
                Err(VolnaError::HandleExpired) if reused && !retried_upload => {
                    warn!(
                        media_id = item.media_id,
                        "endpoint rejected the cached upload handle, re-uploading"
                    );
                    req.handle = self.upload(item).await?;
                    retried_upload = true;
                }
                Err(e) => return Err(e),
            }
        };

        debug!(
            media_id = item.media_id,
            message_id = message_id.0,
            thread = item.message_thread_id,
            "published"
        );
        Ok(codec::encode(&req.handle))
    }

    async fn upload(&mut self, item: &MediaItem) -> Result<UploadHandle, VolnaError> {
        let path = item.full_local_path(&self.config.media_dir);
        loop {
            self.gate.acquire().await;
            match self
                .api
                .upload_file(&path, self.config.upload_threads)
                .await
            {
                Ok(handle) => {
                    debug!(
                        media_id = item.media_id,
                        path = %path.display(),
                        parts = handle.parts(),
                        big = handle.is_big(),
                        "uploaded"
                    );
                    return Ok(handle);
                }
                Err(VolnaError::FloodWait { wait }) => self.suspend(wait).await?,
                Err(e) => return Err(e),
            }
        }
    }

    async fn suspend(&mut self, wait: Duration) -> Result<(), VolnaError> {
        let granted = self.budget.absorb(wait)?;
        warn!(
            wait_secs = granted.as_secs(),
            "endpoint requested flood wait, suspending"
        );
        tokio::time::sleep(granted).await;
        Ok(())
    }
}
