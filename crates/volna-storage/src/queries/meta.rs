// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-bot bookkeeping keyed by the configured slug.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use volna_core::VolnaError;

use crate::database::Database;

/// Record the time of the most recent successful publish. Best effort:
/// the caller logs a failure and keeps going.
pub async fn set_last_publish_time(
    db: &Database,
    slug: &str,
    timestamp: DateTime<Utc>,
) -> Result<(), VolnaError> {
    let slug = slug.to_string();
    let timestamp = timestamp.to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bot_config (slug, recent_upload_time) VALUES (?1, ?2)
                 ON CONFLICT (slug) DO UPDATE SET recent_upload_time = excluded.recent_upload_time",
                params![slug, timestamp],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Time of the most recent successful publish for this slug, if any.
pub async fn get_last_publish_time(
    db: &Database,
    slug: &str,
) -> Result<Option<DateTime<Utc>>, VolnaError> {
    let slug = slug.to_string();
    let raw: Option<String> = db
        .connection()
        .call(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT recent_upload_time FROM bot_config WHERE slug = ?1",
                    params![slug],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(raw.flatten())
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match raw {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| VolnaError::Internal(format!("stored publish time: {e}")))?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
        None => Ok(None),
    }
}
