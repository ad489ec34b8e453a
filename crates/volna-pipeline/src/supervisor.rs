// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session supervisor: restart state machine around the publish session.
//!
//! The supervisor owns the store side of each publish (remove, token lookup
//! and persistence, failure records) and delegates the remote side to a
//! [`PublishSession`]. Removal happens before the send, so delivery is
//! at-most-once: a crash between removal and send drops that one item into
//! the failure sink at worst, and never publishes it twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use volna_core::{CredentialCache, MediaItem, QueueStore, TelegramApi, VolnaError};
use volna_telegram::{PublishSession, SessionConfig};

/// How often the supervisor re-checks the channel while idle. Deliberately
/// much shorter than the feeder's poll interval so new work is picked up
/// promptly after a session ends.
const RECHECK_TICK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running,
    Restarting,
    Stopped,
}

/// Knobs the supervisor needs from the application configuration.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Bot slug used for publish-time bookkeeping.
    pub slug: String,
    pub bot_token: String,
    /// How long a session tolerates an empty channel before closing cleanly.
    pub idle_window: Duration,
    pub session: SessionConfig,
}

pub struct Supervisor<C: TelegramApi> {
    api: Arc<C>,
    store: Arc<dyn QueueStore>,
    cache: CredentialCache,
    config: SupervisorConfig,
    rx: mpsc::Receiver<MediaItem>,
    cancel: CancellationToken,
}

impl<C: TelegramApi> Supervisor<C> {
    pub fn new(
        api: Arc<C>,
        store: Arc<dyn QueueStore>,
        config: SupervisorConfig,
        rx: mpsc::Receiver<MediaItem>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            store,
            cache: CredentialCache::new(),
            config,
            rx,
            cancel,
        }
    }

    /// Runs until cancelled or a fatal error occurs.
    ///
    /// A session is opened only when the channel has work. Clean exits and
    /// error exits both restart the machine; only authentication failure is
    /// fatal to the process.
    pub async fn run(mut self) -> Result<(), VolnaError> {
        let mut state = State::Idle;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    state = State::Stopped;
                    info!(?state, "supervisor stopped");
                    return Ok(());
                }
                _ = tokio::time::sleep(RECHECK_TICK) => {}
            }

            if self.rx.is_empty() {
                continue;
            }

            state = State::Running;
            debug!(?state, "channel has work, opening session");
            match self.run_session().await {
                Ok(()) => info!("session ended cleanly"),
                Err(e) if matches!(e, VolnaError::Auth(_)) => {
                    error!(error = %e, "authentication failed, shutting down");
                    return Err(e);
                }
                Err(e) => error!(error = %e, "session ended with error"),
            }

            if self.cancel.is_cancelled() {
                state = State::Stopped;
                info!(?state, "supervisor stopped");
                return Ok(());
            }
            state = State::Restarting;
            debug!(?state, "session over, watching the channel again");
        }
    }

    /// One session lifetime: authenticate, then drain the channel until it
    /// stays empty for the idle window, an item fails, or we are cancelled.
    async fn run_session(&mut self) -> Result<(), VolnaError> {
        let mut session = PublishSession::connect(
            self.api.clone(),
            &self.cache,
            &self.config.bot_token,
            self.config.session.clone(),
        )
        .await?;

        loop {
            if self.cancel.is_cancelled() {
                debug!("cancelled, not pulling another item");
                return Ok(());
            }

            // Biased so a fired cancellation always wins over a ready item;
            // an unbiased poll could pull one more publish after shutdown.
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("cancelled while waiting for work");
                    return Ok(());
                }
                received = tokio::time::timeout(self.config.idle_window, self.rx.recv()) => {
                    match received {
                        Ok(Some(item)) => item,
                        Ok(None) => {
                            warn!("channel closed, ending session");
                            return Ok(());
                        }
                        Err(_) => {
                            info!(
                                idle_secs = self.config.idle_window.as_secs(),
                                "no work for the idle window, closing session"
                            );
                            return Ok(());
                        }
                    }
                }
            };

            self.publish_one(&mut session, item).await?;
        }
    }

    /// Store choreography around one publish.
    async fn publish_one(
        &self,
        session: &mut PublishSession<C>,
        item: MediaItem,
    ) -> Result<(), VolnaError> {
        // At-most-once boundary: the item leaves the durable queue before
        // the send is attempted.
        self.store.remove_item(item.media_id, item.tag_id).await?;

        let token = match self.store.get_dedup_token(item.media_id).await {
            Ok(token) => Some(token),
            Err(e) if e.is_cache_miss() => None,
            Err(e) => return Err(e),
        };

        match session.publish(&item, token.as_deref()).await {
            Ok(new_token) => {
                self.store
                    .set_dedup_token(item.media_id, &new_token)
                    .await
                    .inspect_err(|e| {
                        error!(
                            media_id = item.media_id,
                            error = %e,
                            "published but could not persist the dedup token"
                        );
                    })?;
                if let Err(e) = self
                    .store
                    .set_last_publish_time(&self.config.slug, Utc::now())
                    .await
                {
                    warn!(error = %e, "failed to record the publish time");
                }
                Ok(())
            }
            Err(e) => {
                if let Err(sink) = self.store.record_failure(&item, &e.to_string()).await {
                    error!(
                        media_id = item.media_id,
                        error = %sink,
                        "failed to record a publish failure"
                    );
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use volna_test_utils::{sample_item, MemoryStore, ScriptedApi};

    fn config() -> SupervisorConfig {
        SupervisorConfig {
            slug: "volna".into(),
            bot_token: "123:ABC".into(),
            idle_window: Duration::from_secs(900),
            session: SessionConfig {
                media_dir: PathBuf::from("/srv/audio"),
                upload_threads: 2,
                rate_limit: Duration::from_millis(0),
                max_flood_wait: Duration::from_secs(3600),
                performer: None,
            },
        }
    }

    async fn wait_for(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_items_and_persists_tokens() {
        let api = Arc::new(ScriptedApi::new());
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let supervisor =
            Supervisor::new(api.clone(), store.clone(), config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();
        tx.send(sample_item(2, 3)).await.unwrap();

        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 2).await;

        assert_eq!(store.removed(), vec![(1, 3), (2, 3)]);
        assert!(store.token(1).is_some());
        assert!(store.token(2).is_some());
        assert_eq!(store.publish_times().len(), 2);
        assert_eq!(api.upload_count(), 2);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_token_means_zero_uploads() {
        let api = Arc::new(ScriptedApi::new());
        let store = Arc::new(MemoryStore::new());
        store.seed_token(1, &volna_telegram::codec::encode(
            &volna_core::UploadHandle::Small {
                id: 7,
                parts: 1,
                name: "lecture-1.mp3".into(),
            },
        ));
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let supervisor =
            Supervisor::new(api.clone(), store.clone(), config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();
        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 1).await;
        assert_eq!(api.upload_count(), 0);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_item_is_removed_once_and_recorded() {
        let api = Arc::new(ScriptedApi::new());
        api.push_upload_error(VolnaError::api("upload rejected"));
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let supervisor =
            Supervisor::new(api.clone(), store.clone(), config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();

        let store2 = store.clone();
        wait_for(move || !store2.failures().is_empty()).await;

        // At-most-once: removed before the failed send, never re-queued.
        assert_eq!(store.removed(), vec![(1, 3)]);
        assert_eq!(store.failures().len(), 1);
        assert!(store.failures()[0].1.contains("upload rejected"));
        assert!(api.sends().is_empty());

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn session_restarts_after_an_error() {
        let api = Arc::new(ScriptedApi::new());
        api.push_upload_error(VolnaError::api("transient"));
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let supervisor =
            Supervisor::new(api.clone(), store.clone(), config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();
        tx.send(sample_item(2, 3)).await.unwrap();

        // Item 1 fails and ends the session; a new session publishes item 2.
        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 1).await;
        assert_eq!(api.sends()[0].message_thread_id, 43);
        assert!(api.auth_count() >= 2);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_is_fatal() {
        let api = Arc::new(ScriptedApi::new());
        api.push_auth_error(VolnaError::Auth("bad token".into()));
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let supervisor = Supervisor::new(api, store, config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, VolnaError::Auth(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_window_closes_the_session_and_new_work_reopens() {
        let api = Arc::new(ScriptedApi::new());
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();

        let mut cfg = config();
        cfg.idle_window = Duration::from_secs(900);
        let supervisor = Supervisor::new(api.clone(), store.clone(), cfg, rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();
        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 1).await;
        assert_eq!(api.auth_count(), 1);

        // Let the idle window elapse so the session closes cleanly.
        tokio::time::sleep(Duration::from_secs(1000)).await;

        // New work opens a fresh session.
        tx.send(sample_item(2, 3)).await.unwrap();
        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 2).await;
        assert_eq!(api.auth_count(), 2);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_without_pulling_more_work() {
        let api = Arc::new(ScriptedApi::new());
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let supervisor =
            Supervisor::new(api.clone(), store.clone(), config(), rx, cancel.clone());
        let handle = tokio::spawn(supervisor.run());

        tx.send(sample_item(1, 3)).await.unwrap();
        let api2 = api.clone();
        wait_for(move || api2.sends().len() == 1).await;

        cancel.cancel();
        tx.send(sample_item(2, 3)).await.unwrap();
        handle.await.unwrap().unwrap();

        // Work queued after cancellation is left untouched.
        assert_eq!(api.sends().len(), 1);
    }
}
