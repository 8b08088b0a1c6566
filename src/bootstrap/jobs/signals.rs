//! Signal handling.
//!
//! - `SIGINT` or `SIGTERM`: the tracker starts closing. Announces and scrapes
//!   are refused and the application exits once every record was written. A
//!   second signal exits right away.
//! - `SIGUSR1` (unix only): the lists are reloaded from the database.
use std::sync::Arc;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::app::Jobs;

/// Resolves when the process gets a termination signal.
pub async fn global_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {}
    }
}

/// It waits for the termination signals and stops the jobs.
pub async fn wait_for_shutdown(container: &Arc<TrackerCoreContainer>, jobs: Jobs) {
    let Jobs {
        http_tracker,
        mut scheduler,
        reload,
    } = jobs;

    let scheduler_stopped = tokio::select! {
        () = global_shutdown_signal() => false,
        _ = &mut scheduler => {
            error!("the scheduler stopped unexpectedly");
            true
        }
    };

    if container.status.shutdown() {
        info!("shutting down, waiting for the write buffers to drain");
        container.write_buffers.flush_all();
        container.token_expiry.flush();
    }

    if !scheduler_stopped {
        tokio::select! {
            () = global_shutdown_signal() => {
                warn!(
                    pending = container.write_buffers.pending(),
                    "second termination signal, exiting without waiting for the write buffers"
                );
            },
            _ = &mut scheduler => {
                info!("every record was written");
            }
        }
    }

    if let Some(reload) = reload {
        reload.abort();
    }

    if let Err(err) = http_tracker.stop().await {
        warn!("{err}");
    }

    info!("tracker stopped");
}

/// It reloads the lists from the database on every `SIGUSR1`.
#[cfg(unix)]
#[must_use]
pub fn start_reload_job(container: &Arc<TrackerCoreContainer>) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut user_defined = match signal(SignalKind::user_defined1()) {
        Ok(user_defined) => user_defined,
        Err(err) => {
            error!("failed to listen for SIGUSR1, the lists can't be reloaded: {err}");
            return None;
        }
    };

    let container = container.clone();

    Some(tokio::spawn(async move {
        while user_defined.recv().await.is_some() {
            info!("reloading the lists from the database");

            match container.loader.load().await {
                Ok(()) => info!("lists reloaded"),
                Err(err) => error!("failed to reload the lists: {err}"),
            }
        }
    }))
}

#[cfg(not(unix))]
#[must_use]
pub fn start_reload_job(_container: &Arc<TrackerCoreContainer>) -> Option<JoinHandle<()>> {
    None
}
