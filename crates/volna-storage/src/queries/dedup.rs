// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dedup token persistence: one opaque token per media id.

use rusqlite::{params, OptionalExtension};

use volna_core::VolnaError;

use crate::database::Database;

/// Look up the dedup token for a media id.
///
/// Absence is a cache miss (`NoDedupToken`), not a store failure.
pub async fn get_token(db: &Database, media_id: i64) -> Result<String, VolnaError> {
    let token: Option<String> = db
        .connection()
        .call(move |conn| {
            let token = conn
                .query_row(
                    "SELECT value FROM media_telegram WHERE media_id = ?1",
                    params![media_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(token)
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    token.ok_or(VolnaError::NoDedupToken { media_id })
}

/// Upsert the dedup token for a media id.
pub async fn set_token(db: &Database, media_id: i64, token: &str) -> Result<(), VolnaError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO media_telegram (media_id, value) VALUES (?1, ?2)
                 ON CONFLICT (media_id) DO UPDATE SET value = excluded.value",
                params![media_id, token],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
