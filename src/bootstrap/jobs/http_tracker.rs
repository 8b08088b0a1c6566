//! HTTP tracker job starter.
use std::sync::Arc;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use swarm_tracker_configuration::HttpTracker;
use tracing::instrument;

use crate::servers::http::server::{HttpServer, RunningHttpServer};

/// It starts a new HTTP tracker server with the provided configuration.
///
/// # Panics
///
/// Will panic if the server can't bind its socket.
#[instrument(skip(config, container))]
pub async fn start_job(config: &HttpTracker, container: &Arc<TrackerCoreContainer>) -> RunningHttpServer {
    HttpServer::new(config, container)
        .start()
        .await
        .expect("it should be able to start the http tracker")
}
