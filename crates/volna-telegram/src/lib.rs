// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram side of the Volna pipeline.
//!
//! Contains the dedup token codec, the per-session flow-control primitives,
//! the publish session itself, and the Bot API transport implementing
//! [`volna_core::TelegramApi`].

pub mod botapi;
pub mod codec;
pub mod session;
pub mod throttle;

pub use botapi::BotApiClient;
pub use session::{PublishSession, SessionConfig};
pub use throttle::{FloodBudget, RateGate};
