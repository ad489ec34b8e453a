// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process credential cache for the remote session.
//!
//! Holds the last-known authentication blob so a restarted session can skip
//! the full handshake. Passed by reference into the session at construction;
//! its lifetime is tied to the process, not to any single session.

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Process-lifetime holder of the endpoint's opaque session credential.
#[derive(Default)]
pub struct CredentialCache {
    blob: ArcSwapOption<Vec<u8>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached credential blob, if any session stored one.
    pub fn load(&self) -> Option<Arc<Vec<u8>>> {
        self.blob.load_full()
    }

    /// Replaces the cached credential blob.
    pub fn store(&self, data: Vec<u8>) {
        self.blob.store(Some(Arc::new(data)));
    }

    /// Drops the cached credential, forcing the next session to re-authenticate.
    pub fn clear(&self) {
        self.blob.store(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_round_trips() {
        let cache = CredentialCache::new();
        assert!(cache.load().is_none());

        cache.store(vec![1, 2, 3]);
        assert_eq!(cache.load().unwrap().as_slice(), &[1, 2, 3]);

        cache.store(vec![9]);
        assert_eq!(cache.load().unwrap().as_slice(), &[9]);

        cache.clear();
        assert!(cache.load().is_none());
    }
}
