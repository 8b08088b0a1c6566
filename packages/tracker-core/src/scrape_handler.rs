//! Scrape handler.
//!
//! The `scrape` request allows clients to query metadata about the swarm in bulk.
//!
//! An `scrape` request includes a list of infohashes whose swarm metadata you
//! want to collect. Only registered torrents are reported, unknown infohashes
//! are left out of the response.
//!
//! ## Scrape Response Format
//!
//! ```text
//! d5:filesd
//!   20:<info-hash>d8:completei11e10:downloadedi13772e10:incompletei19ee
//!   20:<info-hash>d8:completei21e10:downloadedi206e10:incompletei20ee
//! ee
//! ```
//!
//! - `complete`: the number of active peers that have completed downloading (seeders).
//! - `downloaded`: the number of peers that have ever completed downloading.
//! - `incomplete`: the number of active peers that have not completed downloading (leechers).
//!
//! ## References:
//!
//! - [BEP 48. Tracker Protocol Extension: Scrape](https://www.bittorrent.org/beps/bep_0048.html)
//! - [Vuze docs](https://wiki.vuze.com/w/Scrape)
use std::sync::Arc;

use bittorrent_http_protocol::v1::responses::scrape::Scrape;
use bittorrent_primitives::info_hash::InfoHash;
use tracing::{debug, instrument};

use super::torrent::repository::in_memory::InMemoryTorrentRepository;

/// Handles scrape requests, providing torrent swarm metadata.
pub struct ScrapeHandler {
    /// The in-memory torrents repository.
    in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,
}

impl ScrapeHandler {
    /// Creates a new `ScrapeHandler` instance.
    #[must_use]
    pub fn new(in_memory_torrent_repository: &Arc<InMemoryTorrentRepository>) -> Self {
        Self {
            in_memory_torrent_repository: in_memory_torrent_repository.clone(),
        }
    }

    /// Handles a scrape request for multiple torrents.
    ///
    /// # BEP Reference:
    ///
    /// [BEP 48: Scrape Protocol](https://www.bittorrent.org/beps/bep_0048.html)
    #[instrument(skip(self, info_hashes), fields(requested = info_hashes.len()))]
    pub fn scrape(&self, info_hashes: &[InfoHash]) -> Scrape {
        let mut scrape = Scrape::default();

        for info_hash in info_hashes {
            if let Some(swarm_metadata) = self.in_memory_torrent_repository.get_swarm_metadata(info_hash) {
                scrape.add_file(info_hash, swarm_metadata);
            }
        }

        debug!(files = scrape.len(), "scrape handled");

        scrape
    }
}
