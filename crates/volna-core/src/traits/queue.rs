// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue store interface consumed by the pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::VolnaError;
use crate::types::MediaItem;

/// Durable ordered store of pending publish items, a failed-item sink, and
/// a key-value slot for dedup tokens.
///
/// Implementations must return items in strictly increasing store-assigned
/// sequence order; the sequence of the last item in a batch becomes the
/// cursor for the next poll.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Returns up to `limit` items with sequence strictly greater than
    /// `cursor`, plus the new cursor (the maximum sequence in the batch).
    ///
    /// Fails with [`VolnaError::EmptyQueue`] when nothing is pending after
    /// the cursor. That is a scheduling signal, not a hard error.
    async fn poll_queue(
        &self,
        limit: u32,
        cursor: u64,
    ) -> Result<(Vec<MediaItem>, u64), VolnaError>;

    /// Removes an item from the queue. Idempotent.
    async fn remove_item(&self, media_id: i64, tag_id: i64) -> Result<(), VolnaError>;

    /// Appends a failure record for operator triage. The pipeline never
    /// reads these back; losing one silently is not acceptable.
    async fn record_failure(&self, item: &MediaItem, error_text: &str)
        -> Result<(), VolnaError>;

    /// Fetches the dedup token for a media id.
    ///
    /// Fails with [`VolnaError::NoDedupToken`] when absent. Callers treat
    /// that as a cache miss, never as an error worth logging.
    async fn get_dedup_token(&self, media_id: i64) -> Result<String, VolnaError>;

    /// Upserts the dedup token for a media id. Write-once in practice; a
    /// persistence failure must abort the enclosing publish.
    async fn set_dedup_token(&self, media_id: i64, token: &str) -> Result<(), VolnaError>;

    /// Records the most recent successful publish time. Best effort.
    async fn set_last_publish_time(
        &self,
        slug: &str,
        at: DateTime<Utc>,
    ) -> Result<(), VolnaError>;
}
