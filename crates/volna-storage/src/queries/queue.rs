// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue polling, removal, failure recording, and population.

use chrono::NaiveDate;
use rusqlite::params;
use tracing::debug;

use volna_core::{MediaItem, VolnaError};

use crate::database::Database;

/// Parses a `YYYY-MM-DD` column value inside a row mapper.
fn parse_date(index: usize, raw: String) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Poll up to `limit` queue entries with sequence strictly greater than
/// `cursor`, joined with their media, tag, and topic rows.
///
/// Returns the batch and the next cursor (the highest sequence delivered).
/// An entry whose topic has not been published yet (`message_thread_id`
/// NULL) stops the scan; the cursor never advances past it, so it and
/// everything behind it become visible once `topics update` runs.
pub async fn poll_queue(
    db: &Database,
    limit: u32,
    cursor: u64,
) -> Result<(Vec<MediaItem>, u64), VolnaError> {
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT q.id, m.id, m.title, m.teaser, m.path,
                        t.message_thread_id, q.tag_id, g.name,
                        m.occurrence_date, m.issue_date, m.duration_secs, m.size_bytes
                 FROM queue q
                 JOIN media m ON m.id = q.media_id
                 JOIN tag g ON g.id = q.tag_id
                 LEFT JOIN topic t ON t.tag_id = q.tag_id
                 WHERE q.id > ?1
                 ORDER BY q.id ASC
                 LIMIT ?2",
            )?;
            let mapped = stmt.query_map(params![cursor as i64, limit], |row| {
                let seq: i64 = row.get(0)?;
                let tag_id: i64 = row.get(6)?;
                let thread: Option<i64> = row.get(5)?;
                let item = match thread {
                    Some(message_thread_id) => {
                        let occurrence_raw: String = row.get(8)?;
                        let issue_raw: Option<String> = row.get(9)?;
                        let issue_date = match issue_raw {
                            Some(raw) => Some(parse_date(9, raw)?),
                            None => None,
                        };
                        Some(MediaItem {
                            media_id: row.get(1)?,
                            title: row.get(2)?,
                            teaser: row.get(3)?,
                            path: row.get(4)?,
                            message_thread_id,
                            tag_id,
                            tag: row.get(7)?,
                            occurrence_date: parse_date(8, occurrence_raw)?,
                            issue_date,
                            duration_secs: row.get(10)?,
                            size_bytes: row.get(11)?,
                        })
                    }
                    None => None,
                };
                Ok((seq, tag_id, item))
            })?;
            let rows: Vec<(i64, i64, Option<MediaItem>)> = mapped.collect::<Result<_, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let mut items = Vec::new();
    let mut next_cursor = cursor;
    for (seq, tag_id, item) in rows {
        match item {
            Some(item) => {
                next_cursor = seq as u64;
                items.push(item);
            }
            None => {
                debug!(seq, tag_id, "queue entry waits for its topic to be published");
                break;
            }
        }
    }
    if items.is_empty() {
        return Err(VolnaError::EmptyQueue);
    }
    Ok((items, next_cursor))
}

/// Remove a queue entry. Idempotent: removing an absent entry succeeds.
pub async fn remove_item(db: &Database, media_id: i64, tag_id: i64) -> Result<(), VolnaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM queue WHERE media_id = ?1 AND tag_id = ?2",
                params![media_id, tag_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a publish failure in the durable failure sink.
pub async fn record_failure(
    db: &Database,
    item: &MediaItem,
    error_text: &str,
) -> Result<(), VolnaError> {
    let (media_id, tag_id, thread_id) = (item.media_id, item.tag_id, item.message_thread_id);
    let error_text = error_text.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO failed_queue (media_id, tag_id, message_thread_id, error)
                 VALUES (?1, ?2, ?3, ?4)",
                params![media_id, tag_id, thread_id, error_text],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enqueue every media/tag pair whose occurrence date is on or after `since`,
/// optionally restricted to one tag. Existing entries are left alone.
///
/// Returns the number of newly enqueued entries.
pub async fn populate_queue(
    db: &Database,
    since: NaiveDate,
    tag_id: Option<i64>,
) -> Result<usize, VolnaError> {
    let since = since.format("%Y-%m-%d").to_string();
    db.connection()
        .call(move |conn| {
            let inserted = match tag_id {
                Some(tag_id) => conn.execute(
                    "INSERT OR IGNORE INTO queue (media_id, tag_id)
                     SELECT mt.media_id, mt.tag_id
                     FROM media_tag mt
                     JOIN media m ON m.id = mt.media_id
                     WHERE m.occurrence_date >= ?1 AND mt.tag_id = ?2
                     ORDER BY m.occurrence_date ASC",
                    params![since, tag_id],
                )?,
                None => conn.execute(
                    "INSERT OR IGNORE INTO queue (media_id, tag_id)
                     SELECT mt.media_id, mt.tag_id
                     FROM media_tag mt
                     JOIN media m ON m.id = mt.media_id
                     WHERE m.occurrence_date >= ?1
                     ORDER BY m.occurrence_date ASC",
                    params![since],
                )?,
            };
            Ok(inserted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
