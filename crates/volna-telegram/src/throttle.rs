// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flow control for the remote endpoint.
//!
//! Two mechanisms, both owned by the publish session: a [`RateGate`] that
//! enforces minimum spacing between consecutive API calls, and a
//! [`FloodBudget`] that bounds how long a session will keep absorbing
//! endpoint-requested flood waits before giving up.

use std::time::Duration;

use tokio::time::Instant;

use volna_core::VolnaError;

/// Enforces a minimum interval between consecutive API calls.
pub struct RateGate {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// acquire. The first acquire never waits.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last {
            let ready = last + self.min_interval;
            let now = Instant::now();
            if ready > now {
                tokio::time::sleep(ready - now).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Accumulates endpoint-requested flood waits against a fixed ceiling.
///
/// The budget spans the whole session: once the sum of granted waits would
/// exceed the ceiling, the session is considered wedged and must end.
pub struct FloodBudget {
    limit: Duration,
    waited: Duration,
}

impl FloodBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            waited: Duration::ZERO,
        }
    }

    /// Accounts for a requested wait. Returns the wait to sleep, or
    /// [`VolnaError::FloodWaitExceeded`] once the ceiling is crossed.
    pub fn absorb(&mut self, wait: Duration) -> Result<Duration, VolnaError> {
        let total = self.waited + wait;
        if total > self.limit {
            return Err(VolnaError::FloodWaitExceeded {
                waited: total,
                limit: self.limit,
            });
        }
        self.waited = total;
        Ok(wait)
    }
}
