// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consumed-interface traits for the Volna pipeline.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod queue;
pub mod remote;

pub use queue::QueueStore;
pub use remote::TelegramApi;
