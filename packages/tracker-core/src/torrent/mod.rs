//! Swarm data structures.
//!
//! In `BitTorrent` terminology a "swarm" is the collection of peers sharing
//! or downloading a given torrent. The tracker keeps the swarm of every
//! registered torrent in memory:
//!
//! ```text
//! info-hash -> Torrent {
//!     id, completed, balance, free_leech, tokened_users,
//!     seeders:  peer key -> Peer,
//!     leechers: peer key -> Peer,
//! }
//! ```
//!
//! The data structures themselves live in the
//! [`swarm-tracker-torrent-repository`](swarm_tracker_torrent_repository)
//! package. This module contains:
//!
//! - [`repository::in_memory::InMemoryTorrentRepository`]: the operations on
//!   the swarm used by the admin channel, the bulk loader and the reaper.
//! - [`manager::TorrentsManager`]: the same operations plus their side
//!   effects on the global statistics, the deletion reasons and the store.
//!
//! Peers are never persisted. The store only receives snapshots of the swarm
//! size, see [`TorrentSnapshot`](crate::databases::records::TorrentSnapshot).
pub mod manager;
pub mod repository;
