//! Platform-agnostic core logic for the SHT20 telemetry node
//!
//! This crate contains the logic that can be exercised on the host: the
//! SHT20 sensor protocol (generic over `embedded-hal-async` traits), the
//! collector wire format, the delivery policy (backlog + backoff), and
//! the node identity derivation.
//! It has NO hardware dependencies; boards supply the I2C bus and delays.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

#[cfg(test)]
extern crate std;

pub mod identity;
pub mod reading;
pub mod sht20;
pub mod telemetry;

pub use reading::Reading;
pub use sht20::Sht20;
