//! Peer struct used by the swarm store.
//!
//! A sample peer:
//!
//! ```rust,no_run
//! use std::net::Ipv4Addr;
//! use std::sync::Arc;
//!
//! use aquatic_udp_protocol::PeerId;
//! use swarm_tracker_primitives::peer::Peer;
//! use swarm_tracker_primitives::user::User;
//!
//! let user = Arc::new(User::new(1, true, false));
//!
//! let mut peer = Peer::new(PeerId(*b"-qB00000000000000000"), &user);
//! peer.set_endpoint(Some(Ipv4Addr::new(126, 0, 0, 1)), None, 8080);
//! ```
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use aquatic_udp_protocol::PeerId;

use crate::user::User;
use crate::{DurationSinceUnixEpoch, TorrentId, UserId};

/// Length of a compact IPv4 endpoint: 4 address bytes plus 2 port bytes.
pub const COMPACT_IPV4_LEN: usize = 6;

/// Length of a compact IPv6 endpoint: 16 address bytes plus 2 port bytes.
pub const COMPACT_IPV6_LEN: usize = 18;

/// Key of a peer inside one torrent.
///
/// It's made of one byte of the peer id, picked by the torrent id, followed by
/// the decimal user id and the full peer id. The leading byte scatters the
/// ordering of the peer lists so different torrents rotate their seeders in
/// different orders. The key is an internal identifier only.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerKey(Vec<u8>);

impl PeerKey {
    #[must_use]
    pub fn new(torrent_id: TorrentId, user_id: UserId, peer_id: &PeerId) -> Self {
        let scatter_index = 12 + (torrent_id & 7) as usize;

        let user_id = user_id.to_string();

        let mut key = Vec::with_capacity(1 + user_id.len() + peer_id.0.len());
        key.push(peer_id.0[scatter_index]);
        key.extend_from_slice(user_id.as_bytes());
        key.extend_from_slice(&peer_id.0);

        Self(key)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A peer of one torrent's swarm.
#[derive(Debug, Clone)]
pub struct Peer {
    /// ID used by the downloader peer.
    pub peer_id: PeerId,
    /// The user owning the peer. Shared with every other peer of that user.
    pub user: Arc<User>,
    /// The total amount of bytes uploaded by this peer so far.
    pub uploaded: i64,
    /// The total amount of bytes downloaded by this peer so far.
    pub downloaded: i64,
    /// The total amount of corrupt bytes reported by this peer so far.
    pub corrupt: i64,
    /// The number of bytes this peer still has to download.
    pub left: i64,
    pub port: u16,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    /// Precomputed compact IPv4 endpoint.
    pub compact_ipv4: Option<[u8; COMPACT_IPV4_LEN]>,
    /// Precomputed compact IPv6 endpoint.
    pub compact_ipv6: Option<[u8; COMPACT_IPV6_LEN]>,
    pub first_announced: DurationSinceUnixEpoch,
    pub last_announced: DurationSinceUnixEpoch,
    pub announces: u32,
    /// Whether the peer can be handed out to other peers.
    pub visible: bool,
}

impl Peer {
    #[must_use]
    pub fn new(peer_id: PeerId, user: &Arc<User>) -> Self {
        Self {
            peer_id,
            user: user.clone(),
            uploaded: 0,
            downloaded: 0,
            corrupt: 0,
            left: 0,
            port: 0,
            ipv4: None,
            ipv6: None,
            compact_ipv4: None,
            compact_ipv6: None,
            first_announced: DurationSinceUnixEpoch::ZERO,
            last_announced: DurationSinceUnixEpoch::ZERO,
            announces: 0,
            visible: true,
        }
    }

    #[must_use]
    pub fn is_seeder(&self) -> bool {
        self.left == 0
    }

    /// Updates the peer addresses and port.
    ///
    /// The compact encodings are rebuilt only when something changed. It
    /// returns `true` in that case.
    pub fn set_endpoint(&mut self, ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>, port: u16) -> bool {
        if self.ipv4 == ipv4 && self.ipv6 == ipv6 && self.port == port && self.has_endpoint() {
            return false;
        }

        self.ipv4 = ipv4;
        self.ipv6 = ipv6;
        self.port = port;
        self.compact_ipv4 = ipv4.map(|ip| compact_ipv4(ip, port));
        self.compact_ipv6 = ipv6.map(|ip| compact_ipv6(ip, port));

        true
    }

    fn has_endpoint(&self) -> bool {
        self.compact_ipv4.is_some() || self.compact_ipv6.is_some()
    }

    /// The address written to the store: IPv4 when known, otherwise IPv6.
    #[must_use]
    pub fn ip_string(&self) -> String {
        match (self.ipv4, self.ipv6) {
            (Some(ip), _) => ip.to_string(),
            (None, Some(ip)) => ip.to_string(),
            (None, None) => String::new(),
        }
    }

    /// Seconds between the first and the last announce.
    #[must_use]
    pub fn time_spent(&self) -> u64 {
        self.last_announced.saturating_sub(self.first_announced).as_secs()
    }
}

/// 4-byte big-endian address followed by the 2-byte big-endian port.
#[must_use]
pub fn compact_ipv4(ip: Ipv4Addr, port: u16) -> [u8; COMPACT_IPV4_LEN] {
    let mut compact = [0u8; COMPACT_IPV4_LEN];
    compact[..4].copy_from_slice(&ip.octets());
    compact[4..].copy_from_slice(&port.to_be_bytes());
    compact
}

/// 16-byte address followed by the 2-byte big-endian port.
#[must_use]
pub fn compact_ipv6(ip: Ipv6Addr, port: u16) -> [u8; COMPACT_IPV6_LEN] {
    let mut compact = [0u8; COMPACT_IPV6_LEN];
    compact[..16].copy_from_slice(&ip.octets());
    compact[16..].copy_from_slice(&port.to_be_bytes());
    compact
}
