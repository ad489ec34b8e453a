// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `volna upload` command implementation.
//!
//! One-shot manual publish: uploads a file and sends it to a thread,
//! bypassing the queue and the dedup store entirely.

use std::path::PathBuf;

use volna_config::VolnaConfig;
use volna_core::{CredentialCache, SendMediaRequest, TelegramApi, VolnaError};
use volna_telegram::BotApiClient;

pub async fn run_upload(
    config: VolnaConfig,
    path: PathBuf,
    thread: i64,
    title: Option<String>,
) -> Result<(), VolnaError> {
    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| VolnaError::Config("telegram.bot_token is required".into()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| VolnaError::Config(format!("{} has no file name", path.display())))?;
    let title = title.unwrap_or_else(|| file_name.clone());

    let api = BotApiClient::new(&config.telegram.api_base, config.telegram.group_id);
    api.authenticate(&CredentialCache::new(), &bot_token).await?;

    let handle = api
        .upload_file(&path, config.telegram.upload_threads)
        .await?;
    let req = SendMediaRequest {
        message_thread_id: thread,
        handle,
        caption: title.clone(),
        file_name,
        title,
        performer: config.telegram.performer.clone(),
        duration_secs: None,
    };
    let message = api.send_media(&req).await?;
    println!("sent message {}", message.0);
    Ok(())
}
