//! The write-buffer pipeline.
//!
//! Announces produce many small deltas. Instead of writing each one, they are
//! buffered per entity and flushed by the scheduler as one batch statement per
//! entity and tick:
//!
//! | Buffer        | Queue      | Statement                                         |
//! |---------------|------------|---------------------------------------------------|
//! | users         | `users`    | add uploaded and downloaded                       |
//! | torrents      | `torrents` | overwrite the swarm, add snatches, drop orphans   |
//! | heavy peers   | `peers`    | overwrite every column                            |
//! | light peers   | `peers`    | overwrite the announce bookkeeping, zero speeds   |
//! | snatches      | `snatches` | insert                                            |
//! | tokens        | `tokens`   | add downloaded                                    |
//!
//! The peer queue is bounded. Peer rows are the least valuable data and the
//! most voluminous, so they are shed first when the store falls behind.
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use swarm_tracker_configuration::Core;
use tracing::{debug, info};

use super::driver::Driver;
use super::queue::{start_worker, FlushQueue};
use super::records::{HeavyPeer, LightPeer, Snatch, TokenUsage, TorrentSnapshot, UserDelta};
use super::Database;

/// Value tuples waiting for the next flush.
#[derive(Debug, Default)]
struct Buffer {
    values: Mutex<Vec<String>>,
}

impl Buffer {
    fn record(&self, values: String) {
        self.values.lock().push(values);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.values.lock())
    }

    fn len(&self) -> usize {
        self.values.lock().len()
    }
}

/// Buffers, queues and workers of the store writes.
pub struct WriteBuffers {
    database: Arc<Box<dyn Database>>,
    driver: Driver,
    readonly: bool,
    retry_backoff: Duration,

    users: Buffer,
    torrents: Buffer,
    heavy_peers: Buffer,
    light_peers: Buffer,
    snatches: Buffer,
    tokens: Buffer,

    user_queue: Arc<FlushQueue>,
    torrent_queue: Arc<FlushQueue>,
    peer_queue: Arc<FlushQueue>,
    snatch_queue: Arc<FlushQueue>,
    token_queue: Arc<FlushQueue>,
}

impl WriteBuffers {
    #[must_use]
    pub fn new(config: &Core, database: &Arc<Box<dyn Database>>) -> Self {
        Self {
            database: database.clone(),
            driver: database.driver(),
            readonly: config.database.readonly,
            retry_backoff: Duration::from_secs(config.write_buffer.retry_backoff),
            users: Buffer::default(),
            torrents: Buffer::default(),
            heavy_peers: Buffer::default(),
            light_peers: Buffer::default(),
            snatches: Buffer::default(),
            tokens: Buffer::default(),
            user_queue: Arc::new(FlushQueue::new("users")),
            torrent_queue: Arc::new(FlushQueue::new("torrents")),
            peer_queue: Arc::new(FlushQueue::bounded("peers", config.write_buffer.peer_queue_limit)),
            snatch_queue: Arc::new(FlushQueue::new("snatches")),
            token_queue: Arc::new(FlushQueue::new("tokens")),
        }
    }

    pub fn record_user(&self, delta: &UserDelta) {
        self.users.record(delta.values());
    }

    pub fn record_torrent(&self, snapshot: &TorrentSnapshot) {
        self.torrents.record(snapshot.values());
    }

    pub fn record_heavy_peer(&self, peer: &HeavyPeer) {
        self.heavy_peers.record(peer.values(self.driver));
    }

    pub fn record_light_peer(&self, peer: &LightPeer) {
        self.light_peers.record(peer.values(self.driver));
    }

    pub fn record_snatch(&self, snatch: &Snatch) {
        self.snatches.record(snatch.values(self.driver));
    }

    pub fn record_token(&self, usage: &TokenUsage) {
        self.tokens.record(usage.values());
    }

    pub fn flush_users(&self) {
        if let Some(values) = self.take(&self.users, "users") {
            self.enqueue(&self.user_queue, self.driver.upsert_users(&values));
        }
    }

    pub fn flush_torrents(&self) {
        if let Some(values) = self.take(&self.torrents, "torrents") {
            self.enqueue(&self.torrent_queue, self.driver.upsert_torrents(&values));
            self.enqueue(&self.torrent_queue, self.driver.delete_orphan_torrents());
        }
    }

    pub fn flush_peers(&self) {
        if let Some(values) = self.take(&self.heavy_peers, "heavy peers") {
            self.enqueue(&self.peer_queue, self.driver.upsert_heavy_peers(&values));
        }

        if let Some(values) = self.take(&self.light_peers, "light peers") {
            self.enqueue(&self.peer_queue, self.driver.upsert_light_peers(&values));
        }
    }

    pub fn flush_snatches(&self) {
        if let Some(values) = self.take(&self.snatches, "snatches") {
            self.enqueue(&self.snatch_queue, self.driver.insert_snatches(&values));
        }
    }

    pub fn flush_tokens(&self) {
        if let Some(values) = self.take(&self.tokens, "tokens") {
            self.enqueue(&self.token_queue, self.driver.upsert_tokens(&values));
        }
    }

    /// Flushes every buffer. It's called on each scheduler tick.
    pub fn flush_all(&self) {
        self.flush_users();
        self.flush_torrents();
        self.flush_snatches();
        self.flush_peers();
        self.flush_tokens();
    }

    /// Whether every queue is empty. Buffered records that were not flushed
    /// yet are not considered.
    #[must_use]
    pub fn all_clear(&self) -> bool {
        self.queues().iter().all(|queue| queue.is_empty())
    }

    /// Number of records waiting for the next flush.
    #[must_use]
    pub fn buffered(&self) -> usize {
        [
            &self.users,
            &self.torrents,
            &self.heavy_peers,
            &self.light_peers,
            &self.snatches,
            &self.tokens,
        ]
        .iter()
        .map(|buffer| buffer.len())
        .sum()
    }

    /// Number of statements waiting in the queues.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queues().iter().map(|queue| queue.len()).sum()
    }

    /// The heavy peer tuples waiting for the next flush.
    #[cfg(test)]
    pub(crate) fn buffered_heavy_peers(&self) -> Vec<String> {
        self.heavy_peers.values.lock().clone()
    }

    /// The token usage tuples waiting for the next flush.
    #[cfg(test)]
    pub(crate) fn buffered_tokens(&self) -> Vec<String> {
        self.tokens.values.lock().clone()
    }

    fn queues(&self) -> [&Arc<FlushQueue>; 5] {
        [
            &self.user_queue,
            &self.torrent_queue,
            &self.peer_queue,
            &self.snatch_queue,
            &self.token_queue,
        ]
    }

    /// Takes the buffered values joined for a batch statement. In readonly
    /// mode the values are discarded.
    fn take(&self, buffer: &Buffer, entity: &str) -> Option<String> {
        let values = buffer.take();

        if values.is_empty() {
            return None;
        }

        if self.readonly {
            debug!(entity, records = values.len(), "readonly mode, discarding records");
            return None;
        }

        info!(entity, records = values.len(), "flushing records");

        Some(values.join(", "))
    }

    fn enqueue(&self, queue: &Arc<FlushQueue>, statement: String) {
        if queue.push(statement) {
            start_worker(queue, &self.database, self.retry_backoff);
        }
    }
}
