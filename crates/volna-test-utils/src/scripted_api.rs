// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fake `TelegramApi` with injectable errors and call capture.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use volna_core::{
    CredentialCache, MessageId, SendMediaRequest, TelegramApi, UploadHandle, VolnaError,
};

/// A scripted remote endpoint.
///
/// Every call is recorded. Errors pushed onto a per-method queue are
/// returned by the next calls, FIFO, before the default success behavior
/// resumes. Upload handles are minted with sequential ids starting at 1000.
#[derive(Default)]
pub struct ScriptedApi {
    uploads: Mutex<Vec<PathBuf>>,
    sends: Mutex<Vec<SendMediaRequest>>,
    topics: Mutex<Vec<(String, Option<String>)>>,
    upload_errors: Mutex<VecDeque<VolnaError>>,
    send_errors: Mutex<VecDeque<VolnaError>>,
    auth_errors: Mutex<VecDeque<VolnaError>>,
    auth_count: AtomicI64,
    next_handle_id: AtomicI64,
    next_thread_id: AtomicI64,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            next_handle_id: AtomicI64::new(1000),
            next_thread_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    /// Make the next `authenticate` call fail with `error`.
    pub fn push_auth_error(&self, error: VolnaError) {
        self.auth_errors.lock().expect("lock").push_back(error);
    }

    /// Make the next `upload_file` call fail with `error`.
    pub fn push_upload_error(&self, error: VolnaError) {
        self.upload_errors.lock().expect("lock").push_back(error);
    }

    /// Make the next `send_media` call fail with `error`.
    pub fn push_send_error(&self, error: VolnaError) {
        self.send_errors.lock().expect("lock").push_back(error);
    }

    /// Number of successful authentications, i.e. sessions opened.
    pub fn auth_count(&self) -> i64 {
        self.auth_count.load(Ordering::SeqCst)
    }

    /// Number of successful uploads so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().expect("lock").len()
    }

    /// Paths passed to successful uploads, in order.
    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().expect("lock").clone()
    }

    /// Successful send requests, in order.
    pub fn sends(&self) -> Vec<SendMediaRequest> {
        self.sends.lock().expect("lock").clone()
    }

    /// Topics created so far: (name, icon emoji id).
    pub fn created_topics(&self) -> Vec<(String, Option<String>)> {
        self.topics.lock().expect("lock").clone()
    }
}

#[async_trait]
impl TelegramApi for ScriptedApi {
    async fn authenticate(
        &self,
        cache: &CredentialCache,
        bot_token: &str,
    ) -> Result<(), VolnaError> {
        if let Some(err) = self.auth_errors.lock().expect("lock").pop_front() {
            return Err(err);
        }
        cache.store(bot_token.as_bytes().to_vec());
        self.auth_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &Path,
        _threads: usize,
    ) -> Result<UploadHandle, VolnaError> {
        if let Some(err) = self.upload_errors.lock().expect("lock").pop_front() {
            return Err(err);
        }
        self.uploads.lock().expect("lock").push(path.to_path_buf());
        let id = self.next_handle_id.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadHandle::Small { id, parts: 1, name })
    }

    async fn send_media(&self, req: &SendMediaRequest) -> Result<MessageId, VolnaError> {
        if let Some(err) = self.send_errors.lock().expect("lock").pop_front() {
            return Err(err);
        }
        let mut sends = self.sends.lock().expect("lock");
        sends.push(req.clone());
        Ok(MessageId(sends.len() as i64))
    }

    async fn create_forum_topic(
        &self,
        name: &str,
        icon_custom_emoji_id: Option<&str>,
    ) -> Result<i64, VolnaError> {
        self.topics
            .lock()
            .expect("lock")
            .push((name.to_string(), icon_custom_emoji_id.map(str::to_string)));
        Ok(self.next_thread_id.fetch_add(1, Ordering::SeqCst))
    }
}
