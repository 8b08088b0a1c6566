//! Setup for the main tracker application.
//!
//! The [`setup`] only builds the application and its dependencies but it does
//! not start the jobs. Once the setup is done, the lists are loaded from the
//! database and the tracker can serve requests.
use std::sync::Arc;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use swarm_tracker_clock::conv::convert_from_timestamp_to_datetime_utc;
use swarm_tracker_configuration::Configuration;
use tracing::{info, instrument};

use super::config::{initialize_configuration, Args};
use super::logging;
use super::token_expiry::initialize_token_expiry;

/// It loads the configuration, sets up the logging and builds the services.
/// The peer data of the previous run is wiped and the lists are loaded.
///
/// # Panics
///
/// Will panic if the configuration is invalid or if the database can't be
/// reached.
#[instrument(skip(args))]
pub async fn setup(args: &Args) -> (Configuration, Arc<TrackerCoreContainer>) {
    let configuration = initialize_configuration(args);

    logging::setup(&configuration.logging);

    let container = initialize_app_container(&configuration);

    load_data_from_database(&container).await;

    (configuration, container)
}

/// It builds the services the jobs share.
#[must_use]
pub fn initialize_app_container(configuration: &Configuration) -> Arc<TrackerCoreContainer> {
    let core_config = Arc::new(configuration.core.clone());
    let token_expiry = initialize_token_expiry(&core_config);

    let container = Arc::new(TrackerCoreContainer::initialize(&core_config, token_expiry));

    if let Some(start_time) = convert_from_timestamp_to_datetime_utc(container.metrics.start_time()) {
        info!("tracker started at {start_time}");
    }

    container
}

/// # Panics
///
/// Will panic if the lists can't be loaded on startup.
pub async fn load_data_from_database(container: &TrackerCoreContainer) {
    container
        .loader
        .clear_peer_data()
        .expect("Could not clear the peer data of the previous run.");

    container
        .loader
        .load()
        .await
        .expect("Could not load the lists from the database.");
}
