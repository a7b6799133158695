#![deny(unsafe_code)]
#![deny(warnings)]
//! Device identifier utilities for STM32F405
//!
//! This module derives all per-node identity from the factory-programmed
//! 96-bit unique device ID: the node ID sent to the collector, the
//! Ethernet MAC address, and the network stack seed. The UID is stable
//! across reboots and unique to each chip, so every board gets its own
//! identity without per-device configuration. The UID folding itself
//! lives in `sht20_core::identity` where it is host-tested.

use heapless::String;
use sht20_core::identity;

/// Maximum length of the node ID string
/// Format: "sht20-" (6 chars) + 24 hex chars = 30 chars total
pub const NODE_ID_MAX_LEN: usize = 30;

/// Get the STM32F405 unique device ID as a hex string
///
/// Returns a 24-character hex string representing the 96-bit UID.
pub fn uid_hex() -> &'static str {
    embassy_stm32::uid::uid_hex()
}

/// Get the raw 12-byte (96-bit) unique device ID
pub fn uid() -> &'static [u8; 12] {
    embassy_stm32::uid::uid()
}

/// Generate the node ID from the device UID
///
/// Returns an ID in the format `sht20-{24_hex_chars}`, sent to the
/// collector as the first line of every connection.
pub fn node_id() -> String<NODE_ID_MAX_LEN> {
    let uid = uid_hex();
    let mut id = String::<NODE_ID_MAX_LEN>::new();

    // These push_str calls cannot fail because:
    // - "sht20-" is 6 bytes
    // - uid is 24 bytes
    // - Total is 30 bytes, which exactly matches NODE_ID_MAX_LEN
    id.push_str("sht20-").expect("prefix should fit");
    id.push_str(uid).expect("UID should fit");

    id
}

/// Ethernet MAC address derived from the device UID
pub fn mac_address() -> [u8; 6] {
    identity::mac_from_uid(uid())
}

/// Network stack seed derived from the device UID
pub fn stack_seed() -> u64 {
    identity::seed_from_uid(uid())
}
