//! Tracker configurations for testing.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use swarm_tracker_configuration::{Configuration, Threshold};

/// The site password used by test configurations.
pub const SITE_PASSWORD: &str = "sitepasswordsitepasswordsitepass";

/// The report password used by test configurations.
pub const REPORT_PASSWORD: &str = "reportpasswordreportpasswordrepo";

/// Creates an empty temporary file for a `SQLite` database and returns its
/// path. The file is not removed when the test ends.
///
/// # Panics
///
/// Will panic if the temporary file can't be created.
#[must_use]
pub fn ephemeral_sqlite_database() -> PathBuf {
    tempfile::Builder::new()
        .prefix("swarm_tracker_")
        .suffix(".db")
        .tempfile()
        .expect("it should create a temporary database file")
        .into_temp_path()
        .keep()
        .expect("it should keep the temporary database file")
}

/// A configuration for tests:
///
/// - A temporary `SQLite` database.
/// - Random port for the HTTP tracker on localhost.
/// - Known site and report passwords.
///
/// # Panics
///
/// Will panic if the temporary database path is not valid UTF-8.
#[must_use]
pub fn ephemeral() -> Configuration {
    let mut config = Configuration::default();

    config.logging.threshold = Threshold::Off;

    let temp_file = ephemeral_sqlite_database();
    temp_file
        .to_str()
        .expect("temporary path should be valid UTF-8")
        .clone_into(&mut config.core.database.path);

    SITE_PASSWORD.clone_into(&mut config.core.secrets.site_password);
    REPORT_PASSWORD.clone_into(&mut config.core.secrets.report_password);

    config.http_tracker.bind_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

    config
}

/// Ephemeral configuration with keep-alive enabled on the HTTP tracker.
#[must_use]
pub fn ephemeral_with_keepalive() -> Configuration {
    let mut config = ephemeral();

    config.http_tracker.keepalive_timeout = 5;

    config
}

/// Ephemeral configuration that never writes to the store.
#[must_use]
pub fn ephemeral_readonly() -> Configuration {
    let mut config = ephemeral();

    config.core.database.readonly = true;

    config
}
