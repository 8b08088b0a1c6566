//! The state of one torrent.
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound::{Excluded, Unbounded};

use swarm_tracker_primitives::peer::{Peer, PeerKey};
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
use swarm_tracker_primitives::{DurationSinceUnixEpoch, FreeLeech, TorrentId, UserId};

/// Peers of one torrent, ordered by key.
pub type PeerList = BTreeMap<PeerKey, Peer>;

#[derive(Debug, Default)]
pub struct Torrent {
    pub id: TorrentId,
    /// Number of snatches. It only increases.
    pub completed: u32,
    /// Net upload credit of the torrent in bytes.
    pub balance: i64,
    pub free_leech: FreeLeech,
    /// Last time a snapshot of this torrent was queued for the store.
    pub last_flushed: DurationSinceUnixEpoch,
    pub seeders: PeerList,
    pub leechers: PeerList,
    /// The seeder handed out last. The next rotation starts after it.
    pub last_selected_seeder: Option<PeerKey>,
    /// Users holding a free-leech token for this torrent.
    pub tokened_users: HashSet<UserId>,
    retired: bool,
}

/// Number of peers removed from a torrent in one operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemovedPeers {
    pub leechers: u32,
    pub seeders: u32,
}

impl RemovedPeers {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leechers == 0 && self.seeders == 0
    }
}

/// The peer asking for other peers.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: UserId,
    pub is_seeder: bool,
    /// IPv6 endpoints are preferred for requesters with an IPv6 address.
    pub has_ipv6: bool,
    pub compact_ipv4: Option<[u8; 6]>,
}

/// Compact endpoints picked for an announce response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SelectedPeers {
    pub ipv4: Vec<u8>,
    pub ipv6: Vec<u8>,
    pub count: usize,
}

impl SelectedPeers {
    fn push(&mut self, peer: &Peer, prefer_ipv6: bool) {
        if prefer_ipv6 {
            if let Some(compact) = &peer.compact_ipv6 {
                self.ipv6.extend_from_slice(compact);
                self.count += 1;
                return;
            }
        }

        if let Some(compact) = &peer.compact_ipv4 {
            self.ipv4.extend_from_slice(compact);
            self.count += 1;
        }
    }
}

impl Torrent {
    #[must_use]
    pub fn new(id: TorrentId, free_leech: FreeLeech, completed: u32) -> Self {
        Self {
            id,
            free_leech,
            completed,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn get_swarm_metadata(&self) -> SwarmMetadata {
        SwarmMetadata {
            downloaded: self.completed,
            complete: u32::try_from(self.seeders.len()).unwrap_or(u32::MAX),
            incomplete: u32::try_from(self.leechers.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn has_peers(&self) -> bool {
        !self.seeders.is_empty() || !self.leechers.is_empty()
    }

    /// A retired torrent has been removed from the repository. Requests that
    /// got hold of the entry before the removal must treat it as unknown.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Drops every peer and marks the torrent as retired.
    ///
    /// The live counters of the owning users are decremented. The caller is in
    /// charge of the global counters.
    pub fn retire(&mut self) -> RemovedPeers {
        let removed = RemovedPeers {
            leechers: drain_counting(&mut self.leechers, |peer| peer.user.decr_leeching()),
            seeders: drain_counting(&mut self.seeders, |peer| peer.user.decr_seeding()),
        };

        self.last_selected_seeder = None;
        self.retired = true;

        removed
    }

    /// Removes the peers that did not announce since `cutoff`.
    ///
    /// The live counters of the owning users are decremented. The caller is in
    /// charge of the global counters.
    pub fn remove_inactive_peers(&mut self, cutoff: DurationSinceUnixEpoch) -> RemovedPeers {
        let mut removed = RemovedPeers::default();

        self.leechers.retain(|_, peer| {
            let active = peer.last_announced >= cutoff;
            if !active {
                peer.user.decr_leeching();
                removed.leechers += 1;
            }
            active
        });

        self.seeders.retain(|_, peer| {
            let active = peer.last_announced >= cutoff;
            if !active {
                peer.user.decr_seeding();
                removed.seeders += 1;
            }
            active
        });

        removed
    }

    /// Picks up to `limit` peers for the requester.
    ///
    /// A leeching requester gets seeders first, rotating from the seeder after
    /// the last one handed out, and then other leechers. A seeding requester
    /// only gets leechers. Peers of the requester's user, peers of deleted
    /// users and invisible peers are never picked.
    pub fn select_peers(&mut self, requester: &Requester, limit: usize) -> SelectedPeers {
        let mut selected = SelectedPeers::default();

        if limit == 0 {
            return selected;
        }

        if requester.is_seeder {
            for peer in self.leechers.values() {
                if selected.count >= limit {
                    break;
                }
                if peer.user.id() == requester.user_id || peer.user.is_deleted() || !peer.visible {
                    continue;
                }
                selected.push(peer, requester.has_ipv6);
            }

            return selected;
        }

        self.select_seeders(requester, limit, &mut selected);

        if selected.count < limit && self.leechers.len() > 1 {
            for peer in self.leechers.values() {
                if selected.count >= limit {
                    break;
                }
                if peer.user.id() == requester.user_id || peer.user.is_deleted() || !peer.visible {
                    continue;
                }
                if requester.compact_ipv4.is_some() && peer.compact_ipv4 == requester.compact_ipv4 {
                    continue;
                }
                selected.push(peer, requester.has_ipv6);
            }
        }

        selected
    }

    fn select_seeders(&mut self, requester: &Requester, limit: usize, selected: &mut SelectedPeers) {
        if self.seeders.is_empty() {
            return;
        }

        // A cursor pointing to a peer that is gone restarts the rotation.
        let rotation: Box<dyn Iterator<Item = (&PeerKey, &Peer)>> = match &self.last_selected_seeder {
            Some(cursor) if self.seeders.contains_key(cursor) => Box::new(
                self.seeders
                    .range((Excluded(cursor), Unbounded))
                    .chain(self.seeders.range(..=cursor)),
            ),
            _ => Box::new(self.seeders.iter()),
        };

        let mut cursor = None;

        for (key, peer) in rotation {
            if selected.count >= limit {
                break;
            }
            if peer.user.is_deleted() || peer.user.id() == requester.user_id || !peer.visible {
                continue;
            }
            selected.push(peer, requester.has_ipv6);
            cursor = Some(key.clone());
        }

        if cursor.is_some() {
            self.last_selected_seeder = cursor;
        }
    }
}

fn drain_counting(peers: &mut PeerList, on_removed: impl Fn(&Peer)) -> u32 {
    let mut removed = 0;
    for peer in peers.values() {
        on_removed(peer);
        removed += 1;
    }
    peers.clear();
    removed
}
