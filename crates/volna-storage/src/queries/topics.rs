// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forum topic bookkeeping.
//!
//! A topic row with a NULL `created_at` has not been published to Telegram
//! yet; `topics update` creates it remotely and fills in the thread id.

use rusqlite::params;

use volna_core::{Topic, VolnaError};

use crate::database::Database;

fn topic_from_row(row: &rusqlite::Row<'_>) -> Result<Topic, rusqlite::Error> {
    let created_raw: Option<String> = row.get(6)?;
    let created_at = match created_raw {
        Some(raw) => Some(
            chrono::DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&chrono::Utc),
        ),
        None => None,
    };
    Ok(Topic {
        id: row.get(0)?,
        message_thread_id: row.get(1)?,
        name: row.get(2)?,
        tag_id: row.get(3)?,
        tag: row.get(4)?,
        icon_custom_emoji_id: row.get(5)?,
        created_at,
    })
}

/// List every configured topic, published or not.
pub async fn list_topics(db: &Database) -> Result<Vec<Topic>, VolnaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.message_thread_id, t.name, t.tag_id, g.name,
                        t.icon_custom_emoji_id, t.created_at
                 FROM topic t
                 JOIN tag g ON g.id = t.tag_id
                 ORDER BY t.id ASC",
            )?;
            let topics = stmt
                .query_map([], topic_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(topics)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List topics that have not been published to Telegram yet.
pub async fn list_unpublished_topics(db: &Database) -> Result<Vec<Topic>, VolnaError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.message_thread_id, t.name, t.tag_id, g.name,
                        t.icon_custom_emoji_id, t.created_at
                 FROM topic t
                 JOIN tag g ON g.id = t.tag_id
                 WHERE t.created_at IS NULL
                 ORDER BY t.id ASC",
            )?;
            let topics = stmt
                .query_map([], topic_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(topics)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record that a topic now exists remotely under `message_thread_id`.
pub async fn mark_topic_published(
    db: &Database,
    topic_id: i64,
    message_thread_id: i64,
) -> Result<(), VolnaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE topic
                 SET message_thread_id = ?1,
                     created_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![message_thread_id, topic_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
