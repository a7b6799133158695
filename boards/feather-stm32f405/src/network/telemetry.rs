#![deny(unsafe_code)]
#![deny(warnings)]
//! Telemetry client implementing NetworkClient trait
//!
//! Streams sensor readings to the collector over a plain TCP connection.
//! Each `run` call covers one connection lifetime: connect (with timeout),
//! identify the node, flush any backlog, then forward readings as they
//! arrive. When the connection drops, the in-flight reading goes back to
//! the backlog and the error is returned so the caller can pace the
//! reconnect with this client's backoff.

use core::convert::Infallible;

use defmt::{debug, info, warn, Debug2Format};
use embassy_net::dns::DnsQueryType;
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use heapless::String;
use sht20_core::telemetry::{Backlog, Backoff};
use sht20_core::Reading;

use crate::device_id::NODE_ID_MAX_LEN;

use super::client::NetworkClient;
use super::config::TelemetryConfig;
use super::error::NetworkError;
use super::socket::AsyncTcpSocket;
use super::READINGS;

/// Readings held across reconnects while the collector is unreachable
const BACKLOG_CAPACITY: usize = 64;
/// TCP buffer sizing; a reading line is a few dozen bytes
const SOCKET_BUFFER_SIZE: usize = 1024;

/// Telemetry client for the collector connection
pub struct TelemetryClient {
    config: TelemetryConfig,
    node_id: String<NODE_ID_MAX_LEN>,
    backlog: Backlog<BACKLOG_CAPACITY>,
    backoff: Backoff,
}

impl TelemetryClient {
    /// Create a telemetry client for the given collector and node identity
    pub fn new(config: TelemetryConfig, node_id: String<NODE_ID_MAX_LEN>) -> Self {
        let backoff = Backoff::new(config.reconnect_initial_ms, config.reconnect_max_ms);
        Self {
            config,
            node_id,
            backlog: Backlog::new(),
            backoff,
        }
    }

    /// Delay before the next reconnect attempt
    ///
    /// Doubles after every failed session and resets once a connection
    /// is established.
    pub fn next_backoff_ms(&mut self) -> u64 {
        self.backoff.next_delay_ms()
    }

    /// Move any readings waiting in the channel into the backlog
    fn stash_pending(&mut self) {
        let dropped_before = self.backlog.dropped();
        while let Ok(reading) = READINGS.try_receive() {
            self.backlog.push(reading);
        }
        let dropped = self.backlog.dropped() - dropped_before;
        if dropped > 0 {
            warn!("Backlog full, dropped {} oldest readings", dropped);
        }
    }

    async fn resolve(&self, stack: &Stack<'static>) -> Result<IpAddress, NetworkError> {
        // Dotted-quad collector addresses skip the DNS round trip
        if let Ok(addr) = self.config.collector_host.parse::<core::net::Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(addr));
        }
        stack
            .dns_query(self.config.collector_host, DnsQueryType::A)
            .await
            .map_err(|_| NetworkError::DnsError)?
            .first()
            .copied()
            .ok_or(NetworkError::DnsError)
    }

    async fn session(&mut self, stack: &Stack<'static>) -> Result<Infallible, NetworkError> {
        self.stash_pending();

        let addr = self.resolve(stack).await?;
        let endpoint = IpEndpoint::new(addr, self.config.collector_port);

        let mut rx_buffer = [0u8; SOCKET_BUFFER_SIZE];
        let mut tx_buffer = [0u8; SOCKET_BUFFER_SIZE];
        let mut socket = AsyncTcpSocket::new(*stack, &mut rx_buffer, &mut tx_buffer);

        info!("Connecting to collector {}", Debug2Format(&endpoint));
        let timeout = Timer::after(Duration::from_millis(self.config.connect_timeout_ms));
        match embassy_futures::select::select(timeout, socket.connect(endpoint)).await {
            embassy_futures::select::Either::First(_) => return Err(NetworkError::Timeout),
            embassy_futures::select::Either::Second(result) => result?,
        }
        info!("Connected to collector {}", Debug2Format(&endpoint));
        self.backoff.reset();

        // Identify this node before the first reading
        self.send_ident(&mut socket).await?;

        if !self.backlog.is_empty() {
            info!("Flushing {} backlogged readings", self.backlog.len());
        }

        loop {
            self.stash_pending();
            while let Some(reading) = self.backlog.pop() {
                if let Err(e) = self.send_reading(&mut socket, reading).await {
                    self.backlog.requeue_front(reading);
                    socket.close();
                    return Err(e);
                }
            }

            let reading = READINGS.receive().await;
            if let Err(e) = self.send_reading(&mut socket, reading).await {
                self.backlog.push(reading);
                socket.close();
                return Err(e);
            }
        }
    }

    async fn send_ident(&self, socket: &mut AsyncTcpSocket<'_>) -> Result<(), NetworkError> {
        socket.write_all(b"ID: ").await?;
        socket.write_all(self.node_id.as_bytes()).await?;
        socket.write_all(b"\r\n").await?;
        socket.flush().await
    }

    async fn send_reading(
        &self,
        socket: &mut AsyncTcpSocket<'_>,
        reading: Reading,
    ) -> Result<(), NetworkError> {
        let line = reading.to_line();
        socket.write_all(line.as_bytes()).await?;
        socket.flush().await?;
        debug!(
            "Sent reading: T={} C RH={} %",
            reading.temperature_c, reading.humidity_rh
        );
        Ok(())
    }
}

impl NetworkClient for TelemetryClient {
    type Output = Infallible;

    async fn run(&mut self, stack: &Stack<'static>) -> Result<Self::Output, NetworkError> {
        self.session(stack).await
    }
}
