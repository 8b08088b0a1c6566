use std::sync::Arc;
use std::time::Duration;

use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_configuration::Core;
use swarm_tracker_torrent_repository::entry::RemovedPeers;
use tracing::{info, warn};

use super::repository::in_memory::{InactivePeers, InMemoryTorrentRepository, LoadedTorrents};
use crate::databases::pipeline::WriteBuffers;
use crate::databases::records::TorrentSnapshot;
use crate::databases::{self, Database};
use crate::deletion_reasons::{reason_text, DeletionReasons};
use crate::statistics::Metrics;
use crate::CurrentClock;

/// Swarm operations that remove peers in bulk.
///
/// Every operation keeps the global `leechers` and `seeders` statistics equal
/// to the number of peers in the swarm.
pub struct TorrentsManager {
    /// The tracker configuration.
    config: Core,

    /// The in-memory torrents repository.
    in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,

    deletion_reasons: Arc<DeletionReasons>,

    write_buffers: Arc<WriteBuffers>,

    metrics: Arc<Metrics>,
}

impl TorrentsManager {
    #[must_use]
    pub fn new(
        config: &Core,
        in_memory_torrent_repository: &Arc<InMemoryTorrentRepository>,
        deletion_reasons: &Arc<DeletionReasons>,
        write_buffers: &Arc<WriteBuffers>,
        metrics: &Arc<Metrics>,
    ) -> Self {
        Self {
            config: config.clone(),
            in_memory_torrent_repository: in_memory_torrent_repository.clone(),
            deletion_reasons: deletion_reasons.clone(),
            write_buffers: write_buffers.clone(),
            metrics: metrics.clone(),
        }
    }

    /// It loads the torrents and the free-leech tokens from the database.
    /// Peers are not persisted: known torrents keep their live swarm.
    ///
    /// # Errors
    ///
    /// Will return a `database::Error` if unable to load the torrents or the
    /// tokens. The torrents are kept as they were if the first load fails.
    pub fn load_torrents_from_database(
        &self,
        database: &Arc<Box<dyn Database>>,
    ) -> Result<LoadedTorrents, databases::error::Error> {
        let rows = database.load_torrents()?;

        let loaded = self.in_memory_torrent_repository.load(rows);
        self.forget_peers(loaded.removed_peers);

        info!(
            "loaded {} torrents ({} new, {} removed)",
            self.in_memory_torrent_repository.len(),
            loaded.added,
            loaded.removed
        );

        let tokens = database.load_tokens()?;
        let granted = self.in_memory_torrent_repository.load_tokens(tokens);

        info!("loaded {granted} user tokens");

        Ok(loaded)
    }

    /// Removes a torrent deleted by the site and remembers why.
    pub fn delete_torrent(&self, info_hash: &InfoHash, reason: i32) -> bool {
        match self.in_memory_torrent_repository.remove(info_hash) {
            Some((torrent_id, removed)) => {
                info!("deleting torrent {torrent_id} for the reason '{}'", reason_text(reason));

                self.forget_peers(removed);
                self.deletion_reasons.record(*info_hash, reason);

                true
            }
            None => {
                warn!("failed to find torrent {info_hash} to delete");
                false
            }
        }
    }

    /// Evicts the peers that did not announce within the peers timeout.
    ///
    /// An empty swarm snapshot is queued for every torrent left without peers.
    pub fn cleanup_torrents(&self) -> InactivePeers {
        let peers_timeout = Duration::from_secs(u64::from(self.config.tracker_policy.peers_timeout));
        let current_cutoff = CurrentClock::now_sub(&peers_timeout).unwrap_or_default();

        let inactive = self.in_memory_torrent_repository.remove_inactive_peers(current_cutoff);

        self.forget_peers(inactive.removed);

        for torrent in &inactive.emptied {
            self.write_buffers.record_torrent(&TorrentSnapshot {
                torrent_id: torrent.torrent_id,
                seeders: 0,
                leechers: 0,
                snatched: 0,
                balance: torrent.balance,
            });
        }

        inactive
    }

    /// Forgets the deletion reasons older than their lifetime.
    pub fn cleanup_deletion_reasons(&self) -> usize {
        let lifetime = Duration::from_secs(u64::from(self.config.tracker_policy.del_reason_lifetime));

        self.deletion_reasons.purge(lifetime)
    }

    fn forget_peers(&self, removed: RemovedPeers) {
        self.metrics
            .add_peers(-i64::from(removed.leechers), -i64::from(removed.seeders));
    }
}
