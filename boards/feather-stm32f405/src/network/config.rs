#![deny(unsafe_code)]
#![deny(warnings)]
//! Network configuration structures

/// Telemetry client configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Collector hostname or dotted-quad IPv4 address
    pub collector_host: &'static str,
    /// Collector TCP port
    pub collector_port: u16,
    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// First reconnect delay in milliseconds
    pub reconnect_initial_ms: u64,
    /// Reconnect delay ceiling in milliseconds
    pub reconnect_max_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            collector_host: "192.168.1.1",
            collector_port: 8900,
            connect_timeout_ms: 5_000,
            reconnect_initial_ms: 500,
            reconnect_max_ms: 30_000,
        }
    }
}
