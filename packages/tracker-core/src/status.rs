//! Tracker status.
//!
//! Announces and scrapes are only served while the tracker is
//! [`Status::Open`]. The bulk loader pauses the tracker while it reloads the
//! lists and the first shutdown signal closes it for good.
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Status {
    Open,
    Paused,
    Closing,
}

impl Status {
    fn as_u8(self) -> u8 {
        match self {
            Status::Open => 0,
            Status::Paused => 1,
            Status::Closing => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Status::Open,
            1 => Status::Paused,
            _ => Status::Closing,
        }
    }
}

#[derive(Debug)]
pub struct TrackerStatus {
    status: AtomicU8,
}

impl Default for TrackerStatus {
    fn default() -> Self {
        Self::new(Status::Open)
    }
}

impl TrackerStatus {
    #[must_use]
    pub fn new(status: Status) -> Self {
        Self {
            status: AtomicU8::new(status.as_u8()),
        }
    }

    #[must_use]
    pub fn get(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.get() == Status::Open
    }

    /// Pauses or reopens the tracker. A closing tracker stays closing.
    pub fn set(&self, status: Status) {
        let _ = self.status.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
            (Status::from_u8(current) != Status::Closing).then_some(status.as_u8())
        });
    }

    /// Moves the tracker to [`Status::Closing`].
    ///
    /// It returns `false` when the tracker was already closing.
    pub fn shutdown(&self) -> bool {
        self.status.swap(Status::Closing.as_u8(), Ordering::AcqRel) != Status::Closing.as_u8()
    }
}
