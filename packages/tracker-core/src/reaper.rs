//! The reaper.
//!
//! Clients that vanish without a `stopped` announce leave their peers behind.
//! The reaper evicts the peers that did not announce within the peers timeout
//! and forgets the deletion reasons older than their lifetime.
//!
//! A pass runs on its own thread. Only one pass runs at a time: a pass
//! requested while another one is running is skipped.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{error, info};

use crate::torrent::manager::TorrentsManager;

/// What a reaper pass removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReapedItems {
    pub leechers: u32,
    pub seeders: u32,
    pub emptied_torrents: usize,
    pub deletion_reasons: usize,
}

pub struct Reaper {
    torrents_manager: Arc<TorrentsManager>,
    active: Arc<AtomicBool>,
}

impl Reaper {
    #[must_use]
    pub fn new(torrents_manager: &Arc<TorrentsManager>) -> Self {
        Self {
            torrents_manager: torrents_manager.clone(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts a pass on a new thread.
    ///
    /// It returns `None` when a pass is already running.
    pub fn start(&self) -> Option<JoinHandle<ReapedItems>> {
        if self.active.swap(true, Ordering::AcqRel) {
            info!("reaper already running, skipping");
            return None;
        }

        let torrents_manager = self.torrents_manager.clone();
        let active = self.active.clone();

        let spawned = thread::Builder::new().name("reaper".to_string()).spawn(move || {
            let reaped = reap(&torrents_manager);
            active.store(false, Ordering::Release);
            reaped
        });

        match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("failed to start the reaper: {err}");
                self.active.store(false, Ordering::Release);
                None
            }
        }
    }

    /// Runs a pass on the current thread.
    ///
    /// It returns `None` when a pass is already running.
    pub fn run(&self) -> Option<ReapedItems> {
        if self.active.swap(true, Ordering::AcqRel) {
            return None;
        }

        let reaped = reap(&self.torrents_manager);
        self.active.store(false, Ordering::Release);

        Some(reaped)
    }
}

fn reap(torrents_manager: &TorrentsManager) -> ReapedItems {
    info!("starting peer reaper");

    let inactive = torrents_manager.cleanup_torrents();

    info!(
        "reaped {} leechers and {} seeders, {} torrents left without peers",
        inactive.removed.leechers,
        inactive.removed.seeders,
        inactive.emptied.len()
    );

    let deletion_reasons = torrents_manager.cleanup_deletion_reasons();

    info!("removed {deletion_reasons} stale deletion reasons");

    ReapedItems {
        leechers: inactive.removed.leechers,
        seeders: inactive.removed.seeders,
        emptied_torrents: inactive.emptied.len(),
        deletion_reasons,
    }
}
