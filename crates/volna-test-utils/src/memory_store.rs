// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `QueueStore` fake with call recording.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use volna_core::{MediaItem, QueueStore, VolnaError};

/// An in-memory queue store.
///
/// Sequence numbers are assigned on enqueue and never reused, matching the
/// AUTOINCREMENT behavior of the SQLite store. Removals and failures are
/// recorded for assertions. Errors pushed via [`push_poll_error`] are
/// returned by the next polls, FIFO, before normal behavior resumes.
///
/// [`push_poll_error`]: MemoryStore::push_poll_error
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<Vec<(u64, MediaItem)>>,
    next_seq: AtomicU64,
    tokens: Mutex<HashMap<i64, String>>,
    removed: Mutex<Vec<(i64, i64)>>,
    failures: Mutex<Vec<(i64, String)>>,
    publish_times: Mutex<Vec<(String, DateTime<Utc>)>>,
    poll_errors: Mutex<VecDeque<VolnaError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Enqueue an item, returning its assigned sequence number.
    pub fn enqueue(&self, item: MediaItem) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.items.lock().expect("lock").push((seq, item));
        seq
    }

    /// Pre-seed a dedup token.
    pub fn seed_token(&self, media_id: i64, token: &str) {
        self.tokens
            .lock()
            .expect("lock")
            .insert(media_id, token.to_string());
    }

    /// Make the next `poll_queue` call fail with `error`.
    pub fn push_poll_error(&self, error: VolnaError) {
        self.poll_errors.lock().expect("lock").push_back(error);
    }

    /// Pairs removed so far, in order.
    pub fn removed(&self) -> Vec<(i64, i64)> {
        self.removed.lock().expect("lock").clone()
    }

    /// Failure records so far: (media id, error text).
    pub fn failures(&self) -> Vec<(i64, String)> {
        self.failures.lock().expect("lock").clone()
    }

    /// Current token for a media id, if set.
    pub fn token(&self, media_id: i64) -> Option<String> {
        self.tokens.lock().expect("lock").get(&media_id).cloned()
    }

    /// Recorded publish timestamps: (slug, time).
    pub fn publish_times(&self) -> Vec<(String, DateTime<Utc>)> {
        self.publish_times.lock().expect("lock").clone()
    }

    /// Number of items still pending.
    pub fn pending(&self) -> usize {
        self.items.lock().expect("lock").len()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn poll_queue(
        &self,
        limit: u32,
        cursor: u64,
    ) -> Result<(Vec<MediaItem>, u64), VolnaError> {
        if let Some(err) = self.poll_errors.lock().expect("lock").pop_front() {
            return Err(err);
        }

        let items = self.items.lock().expect("lock");
        let batch: Vec<(u64, MediaItem)> = items
            .iter()
            .filter(|(seq, _)| *seq > cursor)
            .take(limit as usize)
            .cloned()
            .collect();
        match batch.last() {
            Some((last_seq, _)) => {
                let next_cursor = *last_seq;
                Ok((
                    batch.into_iter().map(|(_, item)| item).collect(),
                    next_cursor,
                ))
            }
            None => Err(VolnaError::EmptyQueue),
        }
    }

    async fn remove_item(&self, media_id: i64, tag_id: i64) -> Result<(), VolnaError> {
        self.items
            .lock()
            .expect("lock")
            .retain(|(_, item)| !(item.media_id == media_id && item.tag_id == tag_id));
        self.removed.lock().expect("lock").push((media_id, tag_id));
        Ok(())
    }

    async fn record_failure(
        &self,
        item: &MediaItem,
        error_text: &str,
    ) -> Result<(), VolnaError> {
        self.failures
            .lock()
            .expect("lock")
            .push((item.media_id, error_text.to_string()));
        Ok(())
    }

    async fn get_dedup_token(&self, media_id: i64) -> Result<String, VolnaError> {
        self.tokens
            .lock()
            .expect("lock")
            .get(&media_id)
            .cloned()
            .ok_or(VolnaError::NoDedupToken { media_id })
    }

    async fn set_dedup_token(&self, media_id: i64, token: &str) -> Result<(), VolnaError> {
        self.tokens
            .lock()
            .expect("lock")
            .insert(media_id, token.to_string());
        Ok(())
    }

    async fn set_last_publish_time(
        &self,
        slug: &str,
        at: DateTime<Utc>,
    ) -> Result<(), VolnaError> {
        self.publish_times
            .lock()
            .expect("lock")
            .push((slug.to_string(), at));
        Ok(())
    }
}
