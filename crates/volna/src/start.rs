// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `volna start` command implementation.
//!
//! Wires the SQLite store, the Bot API client, and the two pipeline tasks
//! together, then runs until a signal arrives or the supervisor hits a
//! fatal error.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use volna_config::VolnaConfig;
use volna_core::{QueueStore, VolnaError};
use volna_pipeline::{install_signal_handler, Feeder, Supervisor, SupervisorConfig};
use volna_storage::SqliteStore;
use volna_telegram::{BotApiClient, SessionConfig};

/// Builds the per-session configuration from the application config.
pub fn session_config(config: &VolnaConfig) -> SessionConfig {
    SessionConfig {
        media_dir: PathBuf::from(&config.storage.media_dir),
        upload_threads: config.telegram.upload_threads,
        rate_limit: config.telegram.rate_limit(),
        max_flood_wait: config.telegram.max_flood_wait(),
        performer: config.telegram.performer.clone(),
    }
}

/// Runs the `volna start` command.
pub async fn run_start(config: VolnaConfig) -> Result<(), VolnaError> {
    info!("starting volna");

    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| VolnaError::Config("telegram.bot_token is required".into()))?;

    let store = Arc::new(SqliteStore::open(&config.storage.database_path).await?);
    let api = Arc::new(BotApiClient::new(
        &config.telegram.api_base,
        config.telegram.group_id,
    ));

    let shutdown = install_signal_handler();
    let (tx, rx) = mpsc::channel(config.server.page_size as usize);

    let feeder = Feeder::new(
        store.clone() as Arc<dyn QueueStore>,
        config.server.page_size,
        config.server.poll_interval(),
        tx,
        shutdown.token(),
    );
    let supervisor = Supervisor::new(
        api,
        store.clone() as Arc<dyn QueueStore>,
        SupervisorConfig {
            slug: config.server.slug.clone(),
            bot_token,
            idle_window: config.server.idle_window(),
            session: session_config(&config),
        },
        rx,
        shutdown.token(),
    );

    let feeder_task = tokio::spawn(feeder.run());
    let result = supervisor.run().await;
    if result.is_err() {
        // A fatal supervisor error also has to unwind the feeder.
        shutdown.trigger("fatal supervisor error");
    }
    if let Err(e) = feeder_task.await {
        warn!(error = %e, "feeder task panicked");
    }

    match Arc::try_unwrap(store) {
        Ok(store) => store.close().await?,
        Err(_) => warn!("store still referenced at shutdown, skipping checkpoint"),
    }

    info!(
        cause = shutdown.cause().unwrap_or("none"),
        "volna shutdown complete"
    );
    result
}
