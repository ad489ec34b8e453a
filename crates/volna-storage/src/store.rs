// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the QueueStore trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use volna_core::{MediaItem, QueueStore, Topic, VolnaError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed queue store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub async fn open(path: &str) -> Result<Self, VolnaError> {
        let db = Database::open(path).await?;
        Ok(Self { db })
    }

    /// Checkpoint and close the underlying database.
    pub async fn close(self) -> Result<(), VolnaError> {
        self.db.close().await
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // --- Topic operations (admin flow, not part of QueueStore) ---

    pub async fn list_topics(&self) -> Result<Vec<Topic>, VolnaError> {
        queries::topics::list_topics(&self.db).await
    }

    pub async fn list_unpublished_topics(&self) -> Result<Vec<Topic>, VolnaError> {
        queries::topics::list_unpublished_topics(&self.db).await
    }

    pub async fn mark_topic_published(
        &self,
        topic_id: i64,
        message_thread_id: i64,
    ) -> Result<(), VolnaError> {
        queries::topics::mark_topic_published(&self.db, topic_id, message_thread_id).await
    }

    /// Time of the most recent successful publish, if recorded.
    pub async fn get_last_publish_time(
        &self,
        slug: &str,
    ) -> Result<Option<DateTime<Utc>>, VolnaError> {
        queries::meta::get_last_publish_time(&self.db, slug).await
    }

    /// Enqueue media scheduled on or after `since`, optionally for one tag.
    pub async fn populate_queue(
        &self,
        since: NaiveDate,
        tag_id: Option<i64>,
    ) -> Result<usize, VolnaError> {
        queries::queue::populate_queue(&self.db, since, tag_id).await
    }
}

#[async_trait]
impl QueueStore for SqliteStore {
    async fn poll_queue(
        &self,
        limit: u32,
        cursor: u64,
    ) -> Result<(Vec<MediaItem>, u64), VolnaError> {
        queries::queue::poll_queue(&self.db, limit, cursor).await
    }

    async fn remove_item(&self, media_id: i64, tag_id: i64) -> Result<(), VolnaError> {
        queries::queue::remove_item(&self.db, media_id, tag_id).await
    }

    async fn record_failure(&self, item: &MediaItem, error_text: &str) -> Result<(), VolnaError> {
        queries::queue::record_failure(&self.db, item, error_text).await
    }

    async fn get_dedup_token(&self, media_id: i64) -> Result<String, VolnaError> {
        queries::dedup::get_token(&self.db, media_id).await
    }

    async fn set_dedup_token(&self, media_id: i64, token: &str) -> Result<(), VolnaError> {
        queries::dedup::set_token(&self.db, media_id, token).await
    }

    async fn set_last_publish_time(
        &self,
        slug: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), VolnaError> {
        queries::meta::set_last_publish_time(&self.db, slug, timestamp).await
    }
}
