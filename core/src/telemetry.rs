//! Delivery policy: reading backlog and reconnect backoff
//!
//! Readings taken while the collector link is down are held in a bounded
//! in-memory backlog and flushed when the connection comes back. When the
//! backlog is full the oldest reading is dropped, so the node never blocks
//! acquisition on network state.
//!
//! Reconnect attempts are paced by an exponential backoff that resets
//! once a connection succeeds.

use heapless::Deque;

use crate::reading::Reading;

/// Bounded FIFO of undelivered readings.
///
/// Push never fails: when full, the oldest reading is evicted and counted.
pub struct Backlog<const N: usize> {
    queue: Deque<Reading, N>,
    dropped: u32,
}

impl<const N: usize> Backlog<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            dropped: 0,
        }
    }

    /// Queue a reading, evicting the oldest one if the backlog is full.
    pub fn push(&mut self, reading: Reading) {
        if self.queue.is_full() {
            self.queue.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        // Cannot fail: a slot was just freed if the queue was full
        let _ = self.queue.push_back(reading);
    }

    /// Put a reading back at the head of the queue.
    ///
    /// Used when a send fails mid-flush so ordering is preserved. If the
    /// backlog filled up in the meantime the reading is dropped instead.
    pub fn requeue_front(&mut self, reading: Reading) {
        if self.queue.push_front(reading).is_err() {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    /// Take the oldest queued reading.
    pub fn pop(&mut self) -> Option<Reading> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total readings evicted since startup.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<const N: usize> Default for Backlog<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exponential reconnect backoff.
///
/// Yields `initial_ms`, then doubles on every failure up to `max_ms`.
/// `reset` is called after a successful connection.
pub struct Backoff {
    initial_ms: u64,
    max_ms: u64,
    next_ms: u64,
}

impl Backoff {
    pub const fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self {
            initial_ms,
            max_ms,
            next_ms: initial_ms,
        }
    }

    /// Delay to wait before the next attempt, doubling for the one after.
    pub fn next_delay_ms(&mut self) -> u64 {
        let delay = self.next_ms;
        self.next_ms = (self.next_ms.saturating_mul(2)).min(self.max_ms);
        delay
    }

    /// Return to the initial delay after a successful connection.
    pub fn reset(&mut self) {
        self.next_ms = self.initial_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(t: f32) -> Reading {
        Reading {
            temperature_c: t,
            humidity_rh: 50.0,
        }
    }

    #[test]
    fn backlog_preserves_fifo_order() {
        let mut backlog: Backlog<4> = Backlog::new();
        backlog.push(reading(1.0));
        backlog.push(reading(2.0));
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.pop().unwrap().temperature_c, 1.0);
        assert_eq!(backlog.pop().unwrap().temperature_c, 2.0);
        assert!(backlog.is_empty());
    }

    #[test]
    fn backlog_evicts_oldest_when_full() {
        let mut backlog: Backlog<2> = Backlog::new();
        backlog.push(reading(1.0));
        backlog.push(reading(2.0));
        backlog.push(reading(3.0));
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.dropped(), 1);
        assert_eq!(backlog.pop().unwrap().temperature_c, 2.0);
        assert_eq!(backlog.pop().unwrap().temperature_c, 3.0);
    }

    #[test]
    fn requeue_front_restores_send_order() {
        let mut backlog: Backlog<4> = Backlog::new();
        backlog.push(reading(1.0));
        backlog.push(reading(2.0));
        let head = backlog.pop().unwrap();
        backlog.requeue_front(head);
        assert_eq!(backlog.pop().unwrap().temperature_c, 1.0);
    }

    #[test]
    fn requeue_front_drops_when_full() {
        let mut backlog: Backlog<1> = Backlog::new();
        backlog.push(reading(1.0));
        backlog.requeue_front(reading(0.0));
        assert_eq!(backlog.dropped(), 1);
        assert_eq!(backlog.pop().unwrap().temperature_c, 1.0);
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        let mut backoff = Backoff::new(500, 30_000);
        assert_eq!(backoff.next_delay_ms(), 500);
        assert_eq!(backoff.next_delay_ms(), 1_000);
        assert_eq!(backoff.next_delay_ms(), 2_000);
        assert_eq!(backoff.next_delay_ms(), 4_000);
        assert_eq!(backoff.next_delay_ms(), 8_000);
        assert_eq!(backoff.next_delay_ms(), 16_000);
        assert_eq!(backoff.next_delay_ms(), 30_000);
        assert_eq!(backoff.next_delay_ms(), 30_000);
    }

    #[test]
    fn backoff_resets_after_success() {
        let mut backoff = Backoff::new(500, 30_000);
        backoff.next_delay_ms();
        backoff.next_delay_ms();
        backoff.reset();
        assert_eq!(backoff.next_delay_ms(), 500);
    }
}
