//! This module provides functionality for setting up databases.
use std::sync::Arc;

use swarm_tracker_configuration::Core;

use super::driver::{self, Driver};
use super::Database;

/// Initializes and returns a database instance based on the provided configuration.
///
/// It selects the driver (either `Sqlite3` or `MySQL`) as specified in
/// `config.database.driver` and connects to `config.database.path`. Missing
/// tables are created.
///
/// # Panics
///
/// This function will panic if the database cannot be initialized. The tracker
/// can't serve anything without its lists.
///
/// # Example
///
/// ```rust,no_run
/// use swarm_tracker_configuration::Core;
/// use bittorrent_tracker_core::databases::setup::initialize_database;
///
/// let config = Core::default();
///
/// let database = initialize_database(&config);
/// ```
#[must_use]
pub fn initialize_database(config: &Core) -> Arc<Box<dyn Database>> {
    let driver = Driver::from(config.database.driver);

    Arc::new(driver::build(driver, &config.database.path).expect("Database driver build failed."))
}
