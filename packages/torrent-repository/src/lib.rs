//! The in-memory swarm of the tracker.
//!
//! It contains two layers:
//!
//! - [`entry::Torrent`]: the state of one torrent. Its peers are split into
//!   seeders and leechers, both ordered by [`PeerKey`](swarm_tracker_primitives::peer::PeerKey)
//!   so the seeder rotation has a stable order.
//! - [`repository::Torrents`]: the concurrent map from info-hash to torrent
//!   entry. The map itself is a lock-free skip list; each entry has its own
//!   mutex, so announces on different torrents never block each other.
//!
//! Counters of the owning users are kept exact by the code that inserts,
//! migrates and evicts peers. The entry only does it for the operations that
//! remove peers in bulk: eviction of inactive peers and retirement of a
//! deleted torrent.
use std::sync::Arc;

pub mod entry;
pub mod repository;

pub use entry::Torrent;
pub use repository::Torrents;

/// A shared torrent entry.
pub type TorrentEntry = Arc<parking_lot::Mutex<Torrent>>;
