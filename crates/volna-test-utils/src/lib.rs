// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Volna integration tests.
//!
//! Provides in-memory fakes for the two interfaces the pipeline consumes,
//! enabling fast, deterministic, CI-runnable tests without SQLite files or
//! a live endpoint.
//!
//! # Components
//!
//! - [`MemoryStore`] - in-memory `QueueStore` with call recording
//! - [`ScriptedApi`] - fake `TelegramApi` with injectable errors
//! - [`sample_item`] - canonical `MediaItem` fixture

pub mod memory_store;
pub mod scripted_api;

pub use memory_store::MemoryStore;
pub use scripted_api::ScriptedApi;

use chrono::NaiveDate;
use volna_core::MediaItem;

/// A canonical queue item for tests. Media id and tag id are the caller's;
/// everything else is fixed, plausible data.
pub fn sample_item(media_id: i64, tag_id: i64) -> MediaItem {
    MediaItem {
        media_id,
        title: format!("Lecture {media_id}"),
        teaser: None,
        path: format!("lecture-{media_id}.mp3"),
        message_thread_id: 40 + tag_id,
        tag_id,
        tag: format!("tag {tag_id}"),
        occurrence_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
        issue_date: None,
        duration_secs: Some(1800),
        size_bytes: Some(12_000_000),
    }
}
