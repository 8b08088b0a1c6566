//! Why recently deleted torrents were deleted.
//!
//! When the site deletes a torrent the tracker remembers the reason for a
//! while, so clients still announcing to it get an informative failure
//! instead of a bare "Unregistered torrent".
use std::collections::HashMap;
use std::time::Duration;

use bittorrent_primitives::info_hash::InfoHash;
use parking_lot::Mutex;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_primitives::DurationSinceUnixEpoch;

use crate::CurrentClock;

/// Code used by the site when it doesn't give a reason.
pub const NO_REASON: i32 = -1;

const REASONS: [&str; 23] = [
    "Dupe",
    "Trump",
    "Bad File Names",
    "Bad Folder Names",
    "Bad Tags",
    "Disallowed Format",
    "Discs Missing",
    "Discography",
    "Edited Log",
    "Inaccurate Bitrate",
    "Low Bitrate",
    "Mutt Rip",
    "Disallowed Source",
    "Encode Errors",
    "Specifically Banned",
    "Tracks Missing",
    "Transcode",
    "Unapproved Cassette",
    "Unsplit Album",
    "User Compilation",
    "Wrong Format",
    "Wrong Media",
    "Audience Recording",
];

/// The text of a reason code. Unknown codes have no text.
#[must_use]
pub fn reason_text(code: i32) -> &'static str {
    usize::try_from(code)
        .ok()
        .and_then(|index| REASONS.get(index))
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionReason {
    pub code: i32,
    pub time: DurationSinceUnixEpoch,
}

#[derive(Debug, Default)]
pub struct DeletionReasons {
    reasons: Mutex<HashMap<InfoHash, DeletionReason>>,
}

impl DeletionReasons {
    pub fn record(&self, info_hash: InfoHash, code: i32) {
        self.reasons.lock().insert(
            info_hash,
            DeletionReason {
                code,
                time: CurrentClock::now(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, info_hash: &InfoHash) -> Option<DeletionReason> {
        self.reasons.lock().get(info_hash).copied()
    }

    /// Forgets the reasons recorded `lifetime` or more ago. It returns how
    /// many were forgotten.
    pub fn purge(&self, lifetime: Duration) -> usize {
        let cutoff = CurrentClock::now_sub(&lifetime).unwrap_or_default();

        let mut reasons = self.reasons.lock();
        let before = reasons.len();
        reasons.retain(|_, reason| reason.time > cutoff);
        before - reasons.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reasons.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reasons.lock().is_empty()
    }
}
