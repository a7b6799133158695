#![deny(warnings)]
//! Network module with trait-based client architecture
//!
//! This module provides a modular network stack with:
//! - **`client`**: `NetworkClient` trait for protocol implementations
//! - **`config`**: Configuration structs with `Default` implementations
//! - **`error`**: Simple error enum for network operations
//! - **`manager`**: embassy-net stack configuration helpers
//! - **`socket`**: Async TCP socket wrapper for embedded-io-async
//! - **`telemetry`**: Telemetry client implementing `NetworkClient`
//!
//! ## Architecture
//!
//! The design follows the Open-Closed Principle: new protocols can be added
//! by implementing `NetworkClient` without modifying infrastructure code.
//!
//! The sampler task and the telemetry client communicate through the
//! [`READINGS`] channel, so sensor acquisition never blocks on network
//! state. The `embassy-net` stack handles all TCP/IP protocol processing
//! on top of the W5500 device from `embassy-net-wiznet`.

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod socket;
pub mod telemetry;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use sht20_core::Reading;

// Re-export commonly used types
pub use client::NetworkClient;
pub use config::TelemetryConfig;
pub use telemetry::TelemetryClient;

/// Capacity of the sampler-to-telemetry channel
///
/// Sized so that several reconnect backoff periods of readings fit
/// before the channel fills; older readings then spill into the
/// telemetry client's backlog.
pub const READING_CHANNEL_DEPTH: usize = 16;

/// Readings queued from the sampler task to the telemetry client
pub static READINGS: Channel<CriticalSectionRawMutex, Reading, READING_CHANNEL_DEPTH> =
    Channel::new();
