//! Setup for the application logging.
//!
//! It redirects the log info to the standard output with the log threshold
//! defined in the configuration:
//!
//! - `Off`
//! - `Error`
//! - `Warn`
//! - `Info`
//! - `Debug`
//! - `Trace`
//!
//! A `RUST_LOG` env var wins over the configured threshold.
use std::sync::Once;

use swarm_tracker_configuration::{Logging, Threshold};
use tracing::info;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// It redirects the log info to the standard output with the log threshold
/// defined in the configuration. Only the first call installs the subscriber.
pub fn setup(config: &Logging) {
    if config.threshold == Threshold::Off && std::env::var_os(EnvFilter::DEFAULT_ENV).is_none() {
        return;
    }

    INIT.call_once(|| {
        tracing_subscriber::fmt().with_env_filter(env_filter(config)).init();

        info!("logging initialized");
    });
}

/// The filter of the subscriber: `RUST_LOG` if it's set, the configured
/// threshold otherwise.
#[must_use]
pub fn env_filter(config: &Logging) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.threshold.to_string()))
}
