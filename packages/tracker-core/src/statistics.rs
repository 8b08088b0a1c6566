//! Process-wide tracker statistics.
//!
//! Counters are plain atomics. They are updated by the transport (connections
//! and bytes), the request handler (requests, announces and scrapes) and
//! whoever adds or removes peers (leechers and seeders). The scheduler calls
//! [`Metrics::recompute_rates`] on each tick.
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_primitives::DurationSinceUnixEpoch;

use crate::CurrentClock;

#[derive(Debug)]
pub struct Metrics {
    pub open_connections: AtomicU64,
    pub opened_connections: AtomicU64,
    pub requests: AtomicU64,
    pub announcements: AtomicU64,
    pub succ_announcements: AtomicU64,
    pub scrapes: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,
    /// Leecher entries across all torrents.
    pub leechers: AtomicI64,
    /// Seeder entries across all torrents.
    pub seeders: AtomicI64,
    rates: Mutex<Rates>,
    start_time: DurationSinceUnixEpoch,
}

#[derive(Debug, Default, Clone, Copy)]
struct Rates {
    last_opened_connections: u64,
    last_requests: u64,
    connection_rate: u64,
    request_rate: u64,
}

/// A copy of the counters at one point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub open_connections: u64,
    pub opened_connections: u64,
    pub connection_rate: u64,
    pub requests: u64,
    pub request_rate: u64,
    pub announcements: u64,
    pub succ_announcements: u64,
    pub scrapes: u64,
    pub leechers: i64,
    pub seeders: i64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

impl MetricsSnapshot {
    /// Announces that never reached the peer selection.
    #[must_use]
    pub fn failed_announcements(&self) -> u64 {
        self.announcements.saturating_sub(self.succ_announcements)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(CurrentClock::now())
    }
}

impl Metrics {
    #[must_use]
    pub fn new(start_time: DurationSinceUnixEpoch) -> Self {
        Self {
            open_connections: AtomicU64::new(0),
            opened_connections: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            announcements: AtomicU64::new(0),
            succ_announcements: AtomicU64::new(0),
            scrapes: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            leechers: AtomicI64::new(0),
            seeders: AtomicI64::new(0),
            rates: Mutex::default(),
            start_time,
        }
    }

    #[must_use]
    pub fn start_time(&self) -> DurationSinceUnixEpoch {
        self.start_time
    }

    pub fn connection_opened(&self) {
        self.opened_connections.fetch_add(1, Ordering::Relaxed);
        self.open_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .open_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |open| Some(open.saturating_sub(1)));
    }

    pub fn add_bytes_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn add_bytes_written(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Applies a change of the swarm sizes.
    pub fn add_peers(&self, leechers: i64, seeders: i64) {
        if leechers != 0 {
            self.leechers.fetch_add(leechers, Ordering::Relaxed);
        }
        if seeders != 0 {
            self.seeders.fetch_add(seeders, Ordering::Relaxed);
        }
    }

    /// Recomputes the connection and request rates, per second, over the
    /// time since the previous call.
    pub fn recompute_rates(&self, interval: Duration) {
        let seconds = interval.as_secs().max(1);

        let opened = self.opened_connections.load(Ordering::Relaxed);
        let requests = self.requests.load(Ordering::Relaxed);

        let mut rates = self.rates.lock();
        rates.connection_rate = opened.saturating_sub(rates.last_opened_connections) / seconds;
        rates.request_rate = requests.saturating_sub(rates.last_requests) / seconds;
        rates.last_opened_connections = opened;
        rates.last_requests = requests;
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let rates = *self.rates.lock();

        MetricsSnapshot {
            uptime: CurrentClock::now().saturating_sub(self.start_time),
            open_connections: self.open_connections.load(Ordering::Relaxed),
            opened_connections: self.opened_connections.load(Ordering::Relaxed),
            connection_rate: rates.connection_rate,
            requests: self.requests.load(Ordering::Relaxed),
            request_rate: rates.request_rate,
            announcements: self.announcements.load(Ordering::Relaxed),
            succ_announcements: self.succ_announcements.load(Ordering::Relaxed),
            scrapes: self.scrapes.load(Ordering::Relaxed),
            leechers: self.leechers.load(Ordering::Relaxed),
            seeders: self.seeders.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}
