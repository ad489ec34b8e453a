// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `volna topics` command implementations.

use colored::Colorize;
use tracing::info;

use volna_config::VolnaConfig;
use volna_core::{CredentialCache, TelegramApi, VolnaError};
use volna_storage::SqliteStore;
use volna_telegram::BotApiClient;

/// Prints every configured topic and its publish state.
pub async fn run_list(config: VolnaConfig) -> Result<(), VolnaError> {
    let store = SqliteStore::open(&config.storage.database_path).await?;
    let topics = store.list_topics().await?;

    if topics.is_empty() {
        println!("no topics configured");
    }
    for topic in &topics {
        let thread = topic
            .message_thread_id
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".into());
        let status = if topic.created_at.is_some() {
            "published".green()
        } else {
            "pending".yellow()
        };
        println!(
            "{:>4}  {:<32} {:<24} thread={:<10} {}",
            topic.id, topic.name, topic.tag, thread, status
        );
    }

    store.close().await
}

/// Creates every unpublished topic at the endpoint and records its thread id.
pub async fn run_update(config: VolnaConfig) -> Result<(), VolnaError> {
    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| VolnaError::Config("telegram.bot_token is required".into()))?;

    let store = SqliteStore::open(&config.storage.database_path).await?;
    let api = BotApiClient::new(&config.telegram.api_base, config.telegram.group_id);
    api.authenticate(&CredentialCache::new(), &bot_token).await?;

    let pending = store.list_unpublished_topics().await?;
    if pending.is_empty() {
        println!("all topics are published");
        return store.close().await;
    }

    for topic in pending {
        let thread = api
            .create_forum_topic(&topic.name, topic.icon_custom_emoji_id.as_deref())
            .await?;
        store.mark_topic_published(topic.id, thread).await?;
        info!(topic = topic.name.as_str(), thread, "topic created");
        println!("created topic {:?} in thread {thread}", topic.name);
    }

    store.close().await
}
