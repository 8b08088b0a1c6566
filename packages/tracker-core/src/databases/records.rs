//! Rows exchanged with the store.
//!
//! The `*Row` structs are read by the bulk loader. The other structs are
//! buffered by the [`WriteBuffers`](crate::databases::pipeline::WriteBuffers)
//! and rendered as one value tuple of a batch statement each.
use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::{FreeLeech, TorrentId, UserId};

use super::driver::Driver;

/// A registered torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentRow {
    pub id: TorrentId,
    pub info_hash: InfoHash,
    pub free_leech: FreeLeech,
    pub completed: u32,
}

/// An enabled user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: UserId,
    pub passkey: String,
    pub can_leech: bool,
    /// Users that are not visible never have their address stored.
    pub protect_ip: bool,
}

/// A free-leech token: the user and the info-hash of the torrent.
pub type TokenRow = (UserId, InfoHash);

/// Bytes a user transferred since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserDelta {
    pub user_id: UserId,
    pub uploaded: i64,
    pub downloaded: i64,
}

impl UserDelta {
    #[must_use]
    pub fn values(&self) -> String {
        format!("({}, {}, {})", self.user_id, self.uploaded, self.downloaded)
    }
}

/// The swarm of a torrent at the time of an announce or a reaper pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorrentSnapshot {
    pub torrent_id: TorrentId,
    pub seeders: usize,
    pub leechers: usize,
    /// Snatches since the previous snapshot: `1` or `0`.
    pub snatched: u32,
    pub balance: i64,
}

impl TorrentSnapshot {
    #[must_use]
    pub fn values(&self) -> String {
        format!(
            "({}, {}, {}, {}, {})",
            self.torrent_id, self.seeders, self.leechers, self.snatched, self.balance
        )
    }
}

/// Everything known about a peer. Written when the peer changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyPeer {
    pub user_id: UserId,
    pub torrent_id: TorrentId,
    pub active: bool,
    pub uploaded: i64,
    pub downloaded: i64,
    pub upspeed: i64,
    pub downspeed: i64,
    pub left: i64,
    pub corrupt: i64,
    pub time_spent: u64,
    pub announces: u32,
    /// Empty for IP protected users.
    pub ip: String,
    /// The peer id as lowercase hex.
    pub peer_id: String,
    pub user_agent: String,
    pub mtime: u64,
}

impl HeavyPeer {
    #[must_use]
    pub fn values(&self, driver: Driver) -> String {
        format!(
            "({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})",
            self.user_id,
            self.torrent_id,
            u8::from(self.active),
            self.uploaded,
            self.downloaded,
            self.upspeed,
            self.downspeed,
            self.left,
            self.corrupt,
            self.time_spent,
            self.announces,
            driver.quote(&self.ip),
            driver.quote(&self.peer_id),
            driver.quote(&self.user_agent),
            self.mtime
        )
    }
}

/// Announce bookkeeping of a peer that did not change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightPeer {
    pub user_id: UserId,
    pub torrent_id: TorrentId,
    pub time_spent: u64,
    pub announces: u32,
    pub peer_id: String,
    pub mtime: u64,
}

impl LightPeer {
    #[must_use]
    pub fn values(&self, driver: Driver) -> String {
        format!(
            "({}, {}, {}, {}, {}, {})",
            self.user_id,
            self.torrent_id,
            self.time_spent,
            self.announces,
            driver.quote(&self.peer_id),
            self.mtime
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snatch {
    pub user_id: UserId,
    pub torrent_id: TorrentId,
    pub time: u64,
    pub ip: String,
}

impl Snatch {
    #[must_use]
    pub fn values(&self, driver: Driver) -> String {
        format!(
            "({}, {}, {}, {})",
            self.user_id,
            self.torrent_id,
            self.time,
            driver.quote(&self.ip)
        )
    }
}

/// Bytes downloaded while a free-leech token was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub user_id: UserId,
    pub torrent_id: TorrentId,
    pub downloaded: i64,
}

impl TokenUsage {
    #[must_use]
    pub fn values(&self) -> String {
        format!("({}, {}, {})", self.user_id, self.torrent_id, self.downloaded)
    }
}
