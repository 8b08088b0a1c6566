use std::collections::HashSet;
use std::sync::Arc;

use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
use swarm_tracker_primitives::{DurationSinceUnixEpoch, FreeLeech, TorrentId, UserId};
use swarm_tracker_torrent_repository::entry::RemovedPeers;
use swarm_tracker_torrent_repository::{Torrent, TorrentEntry, Torrents};

use crate::databases::records::{TokenRow, TorrentRow};

/// The in-memory torrents repository.
///
/// It wraps the concurrent map of torrents with the operations the tracker
/// needs. None of them touches the global statistics: they return what they
/// removed so the caller can repair the counters.
#[derive(Debug, Default)]
pub struct InMemoryTorrentRepository {
    torrents: Arc<Torrents>,
}

/// A torrent that lost all its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptiedTorrent {
    pub torrent_id: TorrentId,
    pub balance: i64,
}

/// Peers evicted by one pass over all the torrents.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InactivePeers {
    pub removed: RemovedPeers,
    pub emptied: Vec<EmptiedTorrent>,
}

/// What a bulk load changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadedTorrents {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Peers of the removed torrents.
    pub removed_peers: RemovedPeers,
}

impl InMemoryTorrentRepository {
    #[must_use]
    pub fn get(&self, info_hash: &InfoHash) -> Option<TorrentEntry> {
        self.torrents.get(info_hash)
    }

    #[must_use]
    pub fn contains(&self, info_hash: &InfoHash) -> bool {
        self.torrents.contains(info_hash)
    }

    /// Adds a torrent, or changes the policy of the known one. It returns the
    /// id of the torrent in the repository.
    pub fn add_torrent(&self, info_hash: InfoHash, torrent_id: TorrentId, free_leech: FreeLeech) -> TorrentId {
        let (entry, inserted) = self.torrents.insert_if_absent(info_hash, Torrent::new(torrent_id, free_leech, 0));

        let mut torrent = entry.lock();
        if !inserted {
            torrent.free_leech = free_leech;
        }
        torrent.id
    }

    /// It returns the id of the updated torrent, if it's known.
    pub fn set_free_leech(&self, info_hash: &InfoHash, free_leech: FreeLeech) -> Option<TorrentId> {
        self.torrents.get(info_hash).map(|entry| {
            let mut torrent = entry.lock();
            torrent.free_leech = free_leech;
            torrent.id
        })
    }

    pub fn add_token(&self, info_hash: &InfoHash, user_id: UserId) -> bool {
        match self.torrents.get(info_hash) {
            Some(entry) => {
                entry.lock().tokened_users.insert(user_id);
                true
            }
            None => false,
        }
    }

    pub fn remove_token(&self, info_hash: &InfoHash, user_id: UserId) -> bool {
        self.torrents
            .get(info_hash)
            .is_some_and(|entry| entry.lock().tokened_users.remove(&user_id))
    }

    /// Unlinks the torrent and retires it. The owners of its peers are
    /// decremented.
    pub fn remove(&self, info_hash: &InfoHash) -> Option<(TorrentId, RemovedPeers)> {
        self.torrents.remove(info_hash).map(|entry| {
            let mut torrent = entry.lock();
            (torrent.id, torrent.retire())
        })
    }

    /// It returns the data for a `scrape` response, or `None` if the torrent
    /// is not found.
    #[must_use]
    pub fn get_swarm_metadata(&self, info_hash: &InfoHash) -> Option<SwarmMetadata> {
        self.torrents.get(info_hash).map(|entry| entry.lock().get_swarm_metadata())
    }

    /// Removes the peers that did not announce since `cutoff`.
    ///
    /// Only one torrent is locked at a time.
    pub fn remove_inactive_peers(&self, cutoff: DurationSinceUnixEpoch) -> InactivePeers {
        let mut inactive = InactivePeers::default();

        for (_, entry) in self.torrents.entries() {
            let mut torrent = entry.lock();

            let removed = torrent.remove_inactive_peers(cutoff);
            if removed.is_empty() {
                continue;
            }

            inactive.removed.leechers += removed.leechers;
            inactive.removed.seeders += removed.seeders;

            if !torrent.has_peers() {
                inactive.emptied.push(EmptiedTorrent {
                    torrent_id: torrent.id,
                    balance: torrent.balance,
                });
            }
        }

        inactive
    }

    /// Replaces the torrents with the ones loaded from the store.
    ///
    /// Known torrents keep their swarm. Their policy is updated and their
    /// tokens are cleared, waiting for [`Self::load_tokens`]. Torrents missing
    /// from the load are removed.
    pub fn load(&self, rows: Vec<TorrentRow>) -> LoadedTorrents {
        let mut loaded = LoadedTorrents::default();
        let mut info_hashes = HashSet::with_capacity(rows.len());

        for row in rows {
            let (entry, inserted) = self
                .torrents
                .insert_if_absent(row.info_hash, Torrent::new(row.id, row.free_leech, row.completed));

            if inserted {
                loaded.added += 1;
            } else {
                let mut torrent = entry.lock();
                torrent.free_leech = row.free_leech;
                torrent.tokened_users.clear();
                loaded.updated += 1;
            }

            info_hashes.insert(row.info_hash);
        }

        for (info_hash, _) in self.torrents.entries() {
            if info_hashes.contains(&info_hash) {
                continue;
            }

            if let Some((_, removed)) = self.remove(&info_hash) {
                loaded.removed += 1;
                loaded.removed_peers.leechers += removed.leechers;
                loaded.removed_peers.seeders += removed.seeders;
            }
        }

        loaded
    }

    /// Grants the loaded tokens. It returns how many torrents were found.
    pub fn load_tokens(&self, rows: Vec<TokenRow>) -> usize {
        rows.into_iter()
            .filter(|(user_id, info_hash)| self.add_token(info_hash, *user_id))
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }
}
