// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Volna drain pipeline.
//!
//! Two long-lived tasks connected by one bounded channel whose capacity is
//! the queue page size: the [`Feeder`] polls the durable store and pushes
//! items, the [`Supervisor`] opens publish sessions and drains them. A
//! shared [`Shutdown`] token unwinds both cleanly.

pub mod feeder;
pub mod shutdown;
pub mod supervisor;

pub use feeder::Feeder;
pub use shutdown::{install_signal_handler, Shutdown};
pub use supervisor::{Supervisor, SupervisorConfig};
