#![deny(unsafe_code)]
#![deny(warnings)]
//! Async TCP socket wrapper
//!
//! This module provides an async wrapper around `embassy_net::tcp::TcpSocket`
//! that implements the `embedded-io-async` write traits, so protocol clients
//! can stream through one consistent error type. The collector protocol is
//! write-only, so no read side is exposed.

use embassy_net::tcp::TcpSocket;
use embassy_net::{IpEndpoint, Stack};
use embedded_io_async::{ErrorType, Write};

use super::error::NetworkError;

/// Async TCP socket wrapper implementing embedded-io-async traits
pub struct AsyncTcpSocket<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> AsyncTcpSocket<'a> {
    /// Create a new async TCP socket
    ///
    /// # Arguments
    ///
    /// * `stack` - Embassy network stack
    /// * `rx_buffer` - Buffer for receiving data
    /// * `tx_buffer` - Buffer for transmitting data
    pub fn new(stack: Stack<'a>, rx_buffer: &'a mut [u8], tx_buffer: &'a mut [u8]) -> Self {
        Self {
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
        }
    }

    /// Connect to a remote endpoint
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::ConnectFailed` if the connection fails
    pub async fn connect(&mut self, endpoint: IpEndpoint) -> Result<(), NetworkError> {
        self.socket
            .connect(endpoint)
            .await
            .map_err(|_| NetworkError::ConnectFailed)
    }

    /// Close the socket
    pub fn close(&mut self) {
        self.socket.close();
    }
}

/// Error type for embedded-io-async traits
///
/// We use NetworkError as our error type to maintain consistency
/// with the rest of the network module.
impl ErrorType for AsyncTcpSocket<'_> {
    type Error = NetworkError;
}

impl Write for AsyncTcpSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket
            .write(buf)
            .await
            .map_err(|_| NetworkError::SocketError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket
            .flush()
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}
