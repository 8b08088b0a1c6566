use derive_more::Constructor;

/// Swarm statistics for one torrent.
///
/// It's used in the announce and scrape responses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Constructor)]
pub struct SwarmMetadata {
    /// The number of peers that have ever completed downloading.
    pub downloaded: u32,

    /// The number of active peers that have completed downloading (seeders).
    pub complete: u32,

    /// The number of active peers that have not completed downloading (leechers).
    pub incomplete: u32,
}

impl SwarmMetadata {
    #[must_use]
    pub fn zeroed() -> Self {
        Self::default()
    }
}
