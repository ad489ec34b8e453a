// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use volna_core::VolnaError;

use crate::model::VolnaConfig;

/// Validates value constraints figment cannot express.
///
/// A zero page size would make the feeder's poll a no-op and the channel
/// unbounded in the wrong direction, so it is fatal at startup.
pub fn validate_config(config: &VolnaConfig) -> Result<(), VolnaError> {
    if config.server.page_size == 0 {
        return Err(VolnaError::Config(
            "server.page_size must be greater than 0".into(),
        ));
    }
    if config.server.poll_interval_secs == 0 {
        return Err(VolnaError::Config(
            "server.poll_interval_secs must be greater than 0".into(),
        ));
    }
    if config.server.idle_window_secs == 0 {
        return Err(VolnaError::Config(
            "server.idle_window_secs must be greater than 0".into(),
        ));
    }
    if config.telegram.upload_threads == 0 {
        return Err(VolnaError::Config(
            "telegram.upload_threads must be greater than 0".into(),
        ));
    }
    Ok(())
}
