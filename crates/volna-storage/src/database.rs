// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use volna_core::VolnaError;

/// Schema applied idempotently on every open.
///
/// `queue.id` is AUTOINCREMENT so sequence numbers are strictly monotonic and
/// never reused after deletion; the feeder's cursor depends on that.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    teaser TEXT,
    path TEXT NOT NULL DEFAULT '',
    occurrence_date TEXT NOT NULL,
    issue_date TEXT,
    duration_secs INTEGER,
    size_bytes INTEGER
);

CREATE TABLE IF NOT EXISTS tag (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS media_tag (
    media_id INTEGER NOT NULL REFERENCES media(id),
    tag_id INTEGER NOT NULL REFERENCES tag(id),
    PRIMARY KEY (media_id, tag_id)
);

CREATE TABLE IF NOT EXISTS topic (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_thread_id INTEGER,
    name TEXT NOT NULL,
    tag_id INTEGER NOT NULL REFERENCES tag(id),
    icon_custom_emoji_id TEXT,
    created_at TEXT
);

CREATE TABLE IF NOT EXISTS queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    media_id INTEGER NOT NULL REFERENCES media(id),
    tag_id INTEGER NOT NULL REFERENCES tag(id),
    UNIQUE (media_id, tag_id)
);

CREATE TABLE IF NOT EXISTS failed_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    media_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    message_thread_id INTEGER NOT NULL,
    error TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE TABLE IF NOT EXISTS media_telegram (
    media_id INTEGER PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bot_config (
    slug TEXT PRIMARY KEY,
    recent_upload_time TEXT
);
";

/// Owned handle to the SQLite database.
///
/// Cloning the inner [`Connection`] is cheap; all clones share the single
/// background worker thread.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and create the
    /// schema idempotently.
    pub async fn open(path: &str) -> Result<Self, VolnaError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(VolnaError::store)?;
            }
        }

        // `open` reports a plain rusqlite error; only `call` wraps it.
        let conn = Connection::open(path).await.map_err(VolnaError::store)?;
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the shared connection handle.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), VolnaError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Maps a tokio-rusqlite error into the store error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error) -> VolnaError {
    VolnaError::store(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_schema_idempotently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema.db");
        let path = path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();

        // Reopening must not fail on existing tables.
        let db = Database::open(path).await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'queue'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/volna.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        assert!(path.exists());
        db.close().await.unwrap();
    }
}
