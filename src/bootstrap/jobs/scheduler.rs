//! The scheduler job.
//!
//! Every `write_buffer.schedule_interval` seconds it:
//!
//! - Flushes the write buffers and the token expirations.
//! - Recomputes the connection and request rates.
//! - Starts the reaper once `tracker_policy.reap_peers_interval` seconds went
//!   by since the previous pass.
//!
//! Once the tracker is closing, the job ends as soon as every record reached
//! the database.
use std::sync::Arc;
use std::time::Duration;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use bittorrent_tracker_core::status::Status;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_primitives::DurationSinceUnixEpoch;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::CurrentClock;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Flushed,
    Reaped,
    /// The tracker is closing and nothing is left to write.
    Drained,
}

pub struct Scheduler {
    container: Arc<TrackerCoreContainer>,
    schedule_interval: Duration,
    reap_peers_interval: Duration,
    last_reap: DurationSinceUnixEpoch,
}

impl Scheduler {
    #[must_use]
    pub fn new(container: &Arc<TrackerCoreContainer>) -> Self {
        let config = &container.core_config;

        Self {
            container: container.clone(),
            schedule_interval: Duration::from_secs(u64::from(config.write_buffer.schedule_interval.max(1))),
            reap_peers_interval: Duration::from_secs(u64::from(config.tracker_policy.reap_peers_interval)),
            last_reap: CurrentClock::now(),
        }
    }

    #[must_use]
    pub fn schedule_interval(&self) -> Duration {
        self.schedule_interval
    }

    pub fn tick(&mut self) -> Tick {
        let container = &self.container;

        container.write_buffers.flush_all();
        container.token_expiry.flush();
        container.metrics.recompute_rates(self.schedule_interval);

        if container.status.get() == Status::Closing {
            if container.write_buffers.all_clear() && container.token_expiry.all_clear() {
                return Tick::Drained;
            }

            info!(pending = container.write_buffers.pending(), "waiting for the write buffers to drain");

            return Tick::Flushed;
        }

        let now = CurrentClock::now();

        if now.saturating_sub(self.last_reap) >= self.reap_peers_interval {
            self.last_reap = now;
            drop(container.reaper.start());
            return Tick::Reaped;
        }

        Tick::Flushed
    }
}

/// It starts the scheduler. The task ends once the tracker is closing and
/// every record was written.
#[must_use]
#[instrument(skip(container))]
pub fn start_job(container: &Arc<TrackerCoreContainer>) -> JoinHandle<()> {
    let mut scheduler = Scheduler::new(container);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(scheduler.schedule_interval());
        interval.tick().await;

        loop {
            interval.tick().await;

            if scheduler.tick() == Tick::Drained {
                info!("every record was written, the scheduler stops");
                break;
            }
        }
    })
}
