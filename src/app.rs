//! Swarm Tracker application.
//!
//! The tracker application has a global configuration and a set of jobs:
//!
//! - The HTTP tracker.
//! - The scheduler.
//! - The reload of the lists on `SIGUSR1`.
//!
//! All of them share the services built by the
//! [`TrackerCoreContainer`](bittorrent_tracker_core::container::TrackerCoreContainer).
use std::sync::Arc;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use swarm_tracker_configuration::Configuration;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::bootstrap::jobs::{http_tracker, scheduler, signals};
use crate::servers::http::server::RunningHttpServer;

/// The running jobs.
pub struct Jobs {
    pub http_tracker: RunningHttpServer,
    pub scheduler: JoinHandle<()>,
    pub reload: Option<JoinHandle<()>>,
}

/// It starts the jobs.
///
/// # Panics
///
/// Will panic if the HTTP tracker can't be started.
#[instrument(skip(config, container))]
pub async fn start(config: &Configuration, container: &Arc<TrackerCoreContainer>) -> Jobs {
    let scheduler = scheduler::start_job(container);

    let reload = signals::start_reload_job(container);

    let http_tracker = http_tracker::start_job(&config.http_tracker, container).await;

    Jobs {
        http_tracker,
        scheduler,
        reload,
    }
}
