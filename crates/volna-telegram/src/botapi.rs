// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bot API transport.
//!
//! Implements [`TelegramApi`] over the HTTP Bot API. The Bot API has no
//! separate upload step, so `upload_file` mints a process-local handle that
//! maps to the file path and `send_media` performs the actual multipart
//! transfer. A handle minted by a previous process is unknown here and is
//! reported as [`VolnaError::HandleExpired`], which the session resolves
//! with a single re-upload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use volna_core::{
    CredentialCache, MessageId, SendMediaRequest, TelegramApi, UploadHandle, VolnaError,
};

/// Files above this size use the chunked big-file shape.
const BIG_FILE_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Nominal chunk size used to derive the part count.
const PART_SIZE: u64 = 512 * 1024;

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    // No serde(default) here: that would demand `T: Default`, and a missing
    // field already deserializes to `None`.
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[derive(Deserialize)]
struct BotUser {
    id: i64,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Deserialize)]
struct ForumTopic {
    message_thread_id: i64,
}

/// HTTP Bot API client bound to one target group.
pub struct BotApiClient {
    http: reqwest::Client,
    base: String,
    group_id: i64,
    token: ArcSwapOption<String>,
    // Never evicted for the life of the process: a persisted dedup token
    // stays resolvable only while its id is in here. One id and one path
    // per published file.
    uploads: Mutex<HashMap<i64, PathBuf>>,
}

impl BotApiClient {
    pub fn new(api_base: &str, group_id: i64) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: api_base.trim_end_matches('/').to_string(),
            group_id,
            token: ArcSwapOption::empty(),
            uploads: Mutex::new(HashMap::new()),
        }
    }

    fn method_url(&self, method: &str) -> Result<String, VolnaError> {
        let token = self
            .token
            .load_full()
            .ok_or_else(|| VolnaError::Auth("not authenticated".into()))?;
        Ok(format!("{}/bot{}/{}", self.base, token, method))
    }

    fn remember_upload(&self, id: i64, path: PathBuf) -> Result<(), VolnaError> {
        self.uploads
            .lock()
            .map_err(|_| VolnaError::Internal("upload map poisoned".into()))?
            .insert(id, path);
        Ok(())
    }

    fn lookup_upload(&self, id: i64) -> Result<PathBuf, VolnaError> {
        self.uploads
            .lock()
            .map_err(|_| VolnaError::Internal("upload map poisoned".into()))?
            .get(&id)
            .cloned()
            .ok_or(VolnaError::HandleExpired)
    }

    async fn read_response<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, VolnaError> {
        let body: ApiResponse<T> = resp.json().await.map_err(transport)?;
        if body.ok {
            return body
                .result
                .ok_or_else(|| VolnaError::api("response marked ok but carried no result"));
        }
        let description = body.description.unwrap_or_else(|| "no description".into());
        match body.error_code {
            Some(429) => {
                let retry = body
                    .parameters
                    .and_then(|p| p.retry_after)
                    .unwrap_or(1);
                Err(VolnaError::FloodWait {
                    wait: Duration::from_secs(retry),
                })
            }
            Some(401) | Some(403) => Err(VolnaError::Auth(description)),
            _ if description.contains("wrong file identifier")
                || description.contains("FILE_REFERENCE") =>
            {
                Err(VolnaError::HandleExpired)
            }
            _ => Err(VolnaError::api(description)),
        }
    }
}

#[async_trait]
impl TelegramApi for BotApiClient {
    async fn authenticate(
        &self,
        cache: &CredentialCache,
        bot_token: &str,
    ) -> Result<(), VolnaError> {
        let token = if bot_token.is_empty() {
            let blob = cache
                .load()
                .ok_or_else(|| VolnaError::Auth("no bot token configured or cached".into()))?;
            String::from_utf8(blob.to_vec())
                .map_err(|_| VolnaError::Auth("cached credential is not valid UTF-8".into()))?
        } else {
            bot_token.to_string()
        };

        let url = format!("{}/bot{}/getMe", self.base, token);
        let resp = self.http.get(&url).send().await.map_err(transport)?;
        let me: BotUser = Self::read_response(resp).await?;

        cache.store(token.clone().into_bytes());
        self.token.store(Some(Arc::new(token)));
        info!(
            bot_id = me.id,
            bot = me.username.as_deref().unwrap_or("<unnamed>"),
            "authenticated"
        );
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &Path,
        _threads: usize,
    ) -> Result<UploadHandle, VolnaError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            VolnaError::api(format!("media file {}: {e}", path.display()))
        })?;
        if !meta.is_file() {
            return Err(VolnaError::api(format!(
                "media path {} is not a regular file",
                path.display()
            )));
        }

        let id: i64 = rand::random();
        let parts = meta.len().div_ceil(PART_SIZE).max(1) as i32;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.remember_upload(id, path.to_path_buf())?;

        debug!(path = %path.display(), size = meta.len(), parts, "registered upload");
        if meta.len() > BIG_FILE_THRESHOLD {
            Ok(UploadHandle::Big { id, parts, name })
        } else {
            Ok(UploadHandle::Small { id, parts, name })
        }
    }

    async fn send_media(&self, req: &SendMediaRequest) -> Result<MessageId, VolnaError> {
        let path = self.lookup_upload(req.handle.id())?;
        // Stream the file; media can run to gigabytes and must not be
        // buffered in memory.
        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            VolnaError::api(format!("media file {}: {e}", path.display()))
        })?;
        let len = file.metadata().await.map_err(|e| {
            VolnaError::api(format!("media file {}: {e}", path.display()))
        })?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let audio = Part::stream_with_length(body, len)
            .file_name(req.file_name.clone())
            .mime_str("audio/mpeg")
            .map_err(transport)?;

        let mut form = Form::new()
            .text("chat_id", self.group_id.to_string())
            .text("message_thread_id", req.message_thread_id.to_string())
            .text("caption", req.caption.clone())
            .text("title", req.title.clone())
            .part("audio", audio);
        if let Some(performer) = &req.performer {
            form = form.text("performer", performer.clone());
        }
        if let Some(duration) = req.duration_secs {
            form = form.text("duration", duration.to_string());
        }

        let url = self.method_url("sendAudio")?;
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let sent: SentMessage = Self::read_response(resp).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn create_forum_topic(
        &self,
        name: &str,
        icon_custom_emoji_id: Option<&str>,
    ) -> Result<i64, VolnaError> {
        let mut body = json!({
            "chat_id": self.group_id,
            "name": name,
        });
        if let Some(icon) = icon_custom_emoji_id {
            body["icon_custom_emoji_id"] = json!(icon);
        }

        let url = self.method_url("createForumTopic")?;
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let topic: ForumTopic = Self::read_response(resp).await?;
        Ok(topic.message_thread_id)
    }
}

fn transport(e: reqwest::Error) -> VolnaError {
    VolnaError::Api {
        message: format!("transport: {e}"),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn authed_client(server: &MockServer) -> BotApiClient {
        Mock::given(method("GET"))
            .and(path("/bot123:ABC/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 42, "is_bot": true, "username": "volna_bot"}
            })))
            .mount(server)
            .await;
        let client = BotApiClient::new(&server.uri(), -100123);
        client
            .authenticate(&CredentialCache::new(), "123:ABC")
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn authenticate_stores_the_credential_in_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bot123:ABC/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 42, "is_bot": true}
            })))
            .mount(&server)
            .await;

        let cache = CredentialCache::new();
        let client = BotApiClient::new(&server.uri(), -100123);
        client.authenticate(&cache, "123:ABC").await.unwrap();
        assert_eq!(cache.load().unwrap().as_slice(), b"123:ABC");
    }

    #[tokio::test]
    async fn authenticate_falls_back_to_the_cached_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bot123:ABC/getMe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"id": 42, "is_bot": true}
            })))
            .mount(&server)
            .await;

        let cache = CredentialCache::new();
        cache.store(b"123:ABC".to_vec());
        let client = BotApiClient::new(&server.uri(), -100123);
        client.authenticate(&cache, "").await.unwrap();
    }

    #[tokio::test]
    async fn rejected_token_is_an_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botbad/getMe"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ok": false,
                "error_code": 401,
                "description": "Unauthorized"
            })))
            .mount(&server)
            .await;

        let client = BotApiClient::new(&server.uri(), -100123);
        let err = client
            .authenticate(&CredentialCache::new(), "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, VolnaError::Auth(_)));
    }

    #[tokio::test]
    async fn upload_then_send_posts_the_file() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;

        // Matching on the body proves the streamed file content arrives.
        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendAudio"))
            .and(body_string_contains("mp3 bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_id": 555}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lecture.mp3");
        std::fs::write(&file, b"mp3 bytes").unwrap();

        let handle = client.upload_file(&file, 2).await.unwrap();
        assert!(!handle.is_big());
        assert_eq!(handle.parts(), 1);
        assert_eq!(handle.name(), "lecture.mp3");

        let req = SendMediaRequest {
            message_thread_id: 7,
            handle,
            caption: "Morning lecture\n#morning_class".into(),
            file_name: "lecture.mp3".into(),
            title: "Morning lecture".into(),
            performer: Some("Speaker".into()),
            duration_secs: Some(3600),
        };
        let id = client.send_media(&req).await.unwrap();
        assert_eq!(id, MessageId(555));
    }

    #[tokio::test]
    async fn unknown_handle_is_reported_expired_without_a_request() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;

        let req = SendMediaRequest {
            message_thread_id: 7,
            handle: UploadHandle::Small {
                id: 999,
                parts: 1,
                name: "gone.mp3".into(),
            },
            caption: String::new(),
            file_name: "gone.mp3".into(),
            title: String::new(),
            performer: None,
            duration_secs: None,
        };
        let err = client.send_media(&req).await.unwrap_err();
        assert!(matches!(err, VolnaError::HandleExpired));
    }

    #[tokio::test]
    async fn rate_limited_send_surfaces_a_flood_wait() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/bot123:ABC/sendAudio"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 17",
                "parameters": {"retry_after": 17}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lecture.mp3");
        std::fs::write(&file, b"mp3 bytes").unwrap();
        let handle = client.upload_file(&file, 2).await.unwrap();

        let req = SendMediaRequest {
            message_thread_id: 7,
            handle,
            caption: String::new(),
            file_name: "lecture.mp3".into(),
            title: String::new(),
            performer: None,
            duration_secs: None,
        };
        let err = client.send_media(&req).await.unwrap_err();
        assert!(
            matches!(err, VolnaError::FloodWait { wait } if wait == Duration::from_secs(17))
        );
    }

    #[tokio::test]
    async fn create_forum_topic_returns_the_thread_id() {
        let server = MockServer::start().await;
        let client = authed_client(&server).await;

        Mock::given(method("POST"))
            .and(path("/bot123:ABC/createForumTopic"))
            .and(body_string_contains("Morning class"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": {"message_thread_id": 31, "name": "Morning class"}
            })))
            .mount(&server)
            .await;

        let thread = client
            .create_forum_topic("Morning class", Some("54321"))
            .await
            .unwrap();
        assert_eq!(thread, 31);
    }

    #[tokio::test]
    async fn calls_before_authenticate_fail() {
        let server = MockServer::start().await;
        let client = BotApiClient::new(&server.uri(), -100123);
        let err = client.create_forum_topic("x", None).await.unwrap_err();
        assert!(matches!(err, VolnaError::Auth(_)));
    }
}
