//! Torrent repository implementations.
pub mod in_memory;
