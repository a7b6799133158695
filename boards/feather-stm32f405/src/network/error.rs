#![deny(unsafe_code)]
#![deny(warnings)]
//! Network client error types

use defmt::Format;

/// Network client operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// DNS resolution failed
    DnsError,
    /// TCP connect failed
    ConnectFailed,
    /// Connect or request timeout
    Timeout,
    /// Socket read/write error, including connection reset by the peer
    SocketError,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::ConnectFailed => write!(f, "TCP connect failed"),
            Self::Timeout => write!(f, "Request timeout"),
            Self::SocketError => write!(f, "Socket error"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError => embedded_io_async::ErrorKind::BrokenPipe,
            Self::ConnectFailed => embedded_io_async::ErrorKind::ConnectionRefused,
            Self::Timeout => embedded_io_async::ErrorKind::TimedOut,
            Self::DnsError => embedded_io_async::ErrorKind::Other,
        }
    }
}
