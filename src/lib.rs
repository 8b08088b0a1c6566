//! **Swarm Tracker** is a private `BitTorrent` tracker.
//!
//! It serves the users and the torrents registered on a site. The swarms live
//! in memory and every counter the site cares about is written to the site
//! database in batches.
//!
//! This crate is the application: it loads the configuration, wires the
//! services of the [`bittorrent_tracker_core`] crate and starts the jobs:
//!
//! - The [HTTP tracker](servers::http): a TCP server that reads the raw
//!   requests and writes the responses.
//! - The [scheduler](bootstrap::jobs::scheduler): flushes the write buffers
//!   and the token expirations, recomputes the rates and runs the reaper.
//! - The [signal handlers](bootstrap::jobs::signals): cooperative shutdown and
//!   reload of the lists.
//!
//! # Configuration
//!
//! The configuration is read from a TOML file, `./share/default/config/tracker.toml`
//! by default. Any option can be overwritten with an env var:
//!
//! ```text
//! SWARM_TRACKER_CONFIG_OVERRIDE_CORE__DATABASE__PATH=./storage/tracker.db swarm-tracker
//! ```
//!
//! Logs are written to stdout. `RUST_LOG` wins over the `logging.threshold`
//! option.
pub mod app;
pub mod bootstrap;
pub mod servers;

use swarm_tracker_clock::clock;

/// This code needs to be copied into each crate.
/// Working version, for production.
#[cfg(not(test))]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Working;

/// Stopped version, for testing.
#[cfg(test)]
#[allow(dead_code)]
pub(crate) type CurrentClock = clock::Stopped;
