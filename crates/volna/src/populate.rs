// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `volna populate` command implementation.

use chrono::NaiveDate;

use volna_config::VolnaConfig;
use volna_core::VolnaError;
use volna_storage::SqliteStore;

/// Enqueues media scheduled on or after the chosen date.
///
/// `--recent` resolves the date from the recorded time of the most recent
/// publish, so a periodic `populate --recent` keeps the queue topped up
/// without re-scanning the whole catalog.
pub async fn run_populate(
    config: VolnaConfig,
    since: Option<NaiveDate>,
    recent: bool,
    tag_id: Option<i64>,
) -> Result<(), VolnaError> {
    let store = SqliteStore::open(&config.storage.database_path).await?;

    let since = match (since, recent) {
        (Some(date), _) => date,
        (None, true) => store
            .get_last_publish_time(&config.server.slug)
            .await?
            .map(|t| t.date_naive())
            .ok_or_else(|| {
                VolnaError::Config(
                    "no publish time recorded yet; pass an explicit --since date".into(),
                )
            })?,
        (None, false) => {
            return Err(VolnaError::Config("pass --since or --recent".into()));
        }
    };

    let enqueued = store.populate_queue(since, tag_id).await?;
    println!("enqueued {enqueued} items scheduled since {since}");

    store.close().await
}
