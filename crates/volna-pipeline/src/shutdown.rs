// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! SIGINT and SIGTERM cancel a shared [`CancellationToken`] that the feeder
//! and supervisor monitor. The first trigger wins and records its cause for
//! the log sites; later triggers are no-ops.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Shared shutdown state: a cancellation token plus the recorded cause.
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    cause: Arc<OnceLock<String>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// The token observed by every blocking wait in the pipeline.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request shutdown. The first call records `cause` and cancels the
    /// token; further calls are no-ops.
    pub fn trigger(&self, cause: &str) {
        if self.cause.set(cause.to_string()).is_ok() {
            info!(cause, "shutdown requested");
            self.token.cancel();
        } else {
            debug!(cause, "shutdown already in progress");
        }
    }

    /// The recorded cause, once shutdown has been triggered.
    pub fn cause(&self) -> Option<&str> {
        self.cause.get().map(String::as_str)
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// The handler task exits after the first signal; tokio keeps the default
/// signal dispositions replaced for the rest of the process lifetime, so
/// repeated signals during drain do not kill the process.
pub fn install_signal_handler() -> Shutdown {
    let shutdown = Shutdown::new();
    let handler = shutdown.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(stream) => stream,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => handler.trigger("SIGINT"),
                _ = sigterm.recv() => handler.trigger("SIGTERM"),
                _ = handler.token.cancelled() => {}
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => handler.trigger("SIGINT"),
                _ = handler.token.cancelled() => {}
            }
        }
    });

    shutdown
}
