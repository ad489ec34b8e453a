// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue feeder: polls the durable store and feeds the bounded channel.
//!
//! The feeder never removes anything from the store; an item pushed into
//! the channel but not yet published survives a crash or cancellation in
//! the durable queue. Backpressure comes from the channel bound: when the
//! supervisor falls behind, the feeder blocks on `send` and the blocked
//! push unblocks immediately on cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use volna_core::{MediaItem, QueueStore, VolnaError};

pub struct Feeder {
    store: Arc<dyn QueueStore>,
    page_size: u32,
    poll_interval: Duration,
    tx: mpsc::Sender<MediaItem>,
    cancel: CancellationToken,
}

impl Feeder {
    pub fn new(
        store: Arc<dyn QueueStore>,
        page_size: u32,
        poll_interval: Duration,
        tx: mpsc::Sender<MediaItem>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            page_size,
            poll_interval,
            tx,
            cancel,
        }
    }

    /// Runs until cancelled. The cursor starts at zero and only advances;
    /// an empty poll or a transient store error waits out the poll interval
    /// and retries without touching the cursor.
    pub async fn run(self) {
        let mut cursor: u64 = 0;
        loop {
            if self.cancel.is_cancelled() {
                debug!("feeder cancelled");
                return;
            }

            match self.store.poll_queue(self.page_size, cursor).await {
                Ok((items, next_cursor)) => {
                    debug!(count = items.len(), cursor, next_cursor, "fetched batch");
                    cursor = next_cursor;
                    for item in items {
                        tokio::select! {
                            biased;
                            _ = self.cancel.cancelled() => {
                                debug!("feeder cancelled while pushing a batch");
                                return;
                            }
                            sent = self.tx.send(item) => {
                                if sent.is_err() {
                                    warn!("channel closed, feeder exiting");
                                    return;
                                }
                            }
                        }
                    }
                    // A full page suggests more is pending; poll again now.
                    continue;
                }
                Err(VolnaError::EmptyQueue) => {
                    debug!(cursor, "queue empty");
                }
                Err(e) => {
                    error!(error = %e, "queue poll failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.cancel.cancelled() => {
                    debug!("feeder cancelled while waiting for the next poll");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use volna_test_utils::{sample_item, MemoryStore};

    #[tokio::test(start_paused = true)]
    async fn feeds_all_items_in_cursor_order() {
        let store = Arc::new(MemoryStore::new());
        for media_id in 1..=5 {
            store.enqueue(sample_item(media_id, 1));
        }

        let (tx, mut rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let feeder = Feeder::new(
            store.clone(),
            2,
            Duration::from_secs(900),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(feeder.run());

        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(rx.recv().await.unwrap().media_id);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        // Nothing was removed from the durable store.
        assert_eq!(store.pending(), 5);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_push_unblocks_on_cancellation() {
        let store = Arc::new(MemoryStore::new());
        for media_id in 1..=5 {
            store.enqueue(sample_item(media_id, 1));
        }

        // Capacity 2 and no consumer: the feeder fills the channel and
        // blocks on the third push.
        let (tx, rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let feeder = Feeder::new(
            store.clone(),
            5,
            Duration::from_secs(900),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(feeder.run());

        // Let the feeder reach the blocked send.
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        cancel.cancel();
        handle.await.unwrap();

        // The blocked item and everything behind it stayed in the store.
        assert_eq!(store.pending(), 5);
        drop(rx);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_store_error_retries_after_the_interval() {
        let store = Arc::new(MemoryStore::new());
        store.push_poll_error(VolnaError::store(std::io::Error::other("disk gone")));
        store.enqueue(sample_item(1, 1));

        let (tx, mut rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let feeder = Feeder::new(
            store.clone(),
            2,
            Duration::from_secs(60),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(feeder.run());

        // First poll fails; after the virtual interval the retry succeeds.
        let item = rx.recv().await.unwrap();
        assert_eq!(item.media_id, 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_queue_waits_and_picks_up_new_work() {
        let store = Arc::new(MemoryStore::new());
        let (tx, mut rx) = mpsc::channel(2);
        let cancel = CancellationToken::new();
        let feeder = Feeder::new(
            store.clone(),
            2,
            Duration::from_secs(60),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(feeder.run());

        tokio::task::yield_now().await;
        store.enqueue(sample_item(9, 1));

        let item = rx.recv().await.unwrap();
        assert_eq!(item.media_id, 9);

        cancel.cancel();
        handle.await.unwrap();
    }
}
