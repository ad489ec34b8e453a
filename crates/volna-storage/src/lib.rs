// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite queue store for Volna.
//!
//! A single write-serialized connection (tokio-rusqlite) in WAL mode backs
//! the media queue, dedup tokens, failure sink, forum topic bookkeeping, and
//! per-bot metadata.

pub mod database;
pub mod queries;
pub mod store;

pub use database::Database;
pub use store::SqliteStore;
