//! Torrent-wide download accounting policy.
use serde::{Deserialize, Serialize};

/// How the downloaded bytes of a torrent count against the users.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, derive_more::Display)]
pub enum FreeLeech {
    /// Uploads and downloads are both recorded.
    #[default]
    Normal,
    /// Downloads are not recorded.
    Free,
    /// Neither uploads nor downloads are recorded.
    Neutral,
}

impl FreeLeech {
    /// Parses the flag used by the site: `0` normal, `1` free and anything
    /// else neutral.
    #[must_use]
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "0" => FreeLeech::Normal,
            "1" => FreeLeech::Free,
            _ => FreeLeech::Neutral,
        }
    }

    /// Parses the `free_torrent` column of the store: `1` free, `2` neutral
    /// and anything else normal.
    #[must_use]
    pub fn from_stored(flag: &str) -> Self {
        match flag {
            "1" => FreeLeech::Free,
            "2" => FreeLeech::Neutral,
            _ => FreeLeech::Normal,
        }
    }
}
