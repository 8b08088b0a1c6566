//! Primitive types shared by the swarm tracker packages.
//!
//! This crate only contains data structures and tiny helpers. The logic that
//! mutates them lives in the torrent repository and the tracker core.
use std::time::Duration;

pub mod free_leech;
pub mod peer;
pub mod swarm_metadata;
pub mod user;

pub use free_leech::FreeLeech;

/// Duration since the Unix Epoch.
pub type DurationSinceUnixEpoch = Duration;

/// The numeric id the site database assigns to a user.
pub type UserId = u32;

/// The numeric id the site database assigns to a torrent.
pub type TorrentId = u32;
