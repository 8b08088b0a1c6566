//! The concurrent map of torrents.
use std::sync::Arc;

use bittorrent_primitives::info_hash::InfoHash;
use crossbeam_skiplist::SkipMap;

use crate::entry::Torrent;
use crate::TorrentEntry;

/// Torrents indexed by info-hash.
///
/// The map never holds a lock while an entry is in use. Removing a torrent
/// only unlinks the entry: announces that already got the entry have to check
/// [`Torrent::is_retired`] once they lock it.
#[derive(Default, Debug)]
pub struct Torrents {
    torrents: SkipMap<InfoHash, TorrentEntry>,
}

impl Torrents {
    #[must_use]
    pub fn get(&self, info_hash: &InfoHash) -> Option<TorrentEntry> {
        self.torrents.get(info_hash).map(|entry| entry.value().clone())
    }

    /// Inserts the torrent unless the info-hash is already known.
    ///
    /// It returns the entry in the map and whether it was inserted.
    pub fn insert_if_absent(&self, info_hash: InfoHash, torrent: Torrent) -> (TorrentEntry, bool) {
        let candidate: TorrentEntry = Arc::new(parking_lot::Mutex::new(torrent));

        let entry = self.torrents.get_or_insert(info_hash, candidate.clone());

        let inserted = Arc::ptr_eq(entry.value(), &candidate);

        (entry.value().clone(), inserted)
    }

    /// Unlinks the torrent from the map and returns its entry.
    pub fn remove(&self, info_hash: &InfoHash) -> Option<TorrentEntry> {
        self.torrents.remove(info_hash).map(|entry| entry.value().clone())
    }

    #[must_use]
    pub fn contains(&self, info_hash: &InfoHash) -> bool {
        self.torrents.contains_key(info_hash)
    }

    /// A snapshot of all entries, ordered by info-hash.
    #[must_use]
    pub fn entries(&self) -> Vec<(InfoHash, TorrentEntry)> {
        self.torrents
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
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
