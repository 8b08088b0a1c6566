//! The core `bittorrent-tracker-core` crate contains the logic of a private
//! `BitTorrent` tracker which is independent of the delivery layer.
//!
//! It contains the tracker services and their dependencies. It's a domain layer
//! which does not specify how the bytes of a request reach the tracker.
//!
//! ```text
//!   Delivery layer  |   Domain layer
//! -----------------------------------
//!     HTTP tracker  |-> Request handler -> Announce / Scrape / Update / Report
//!        Scheduler  |-> Write buffers, token expiry, reaper
//!          Signals  |-> Loader, status
//! ```
//!
//! # Table of contents
//!
//! - [Introduction](#introduction)
//! - [Configuration](#configuration)
//! - [Request handler](#request-handler)
//! - [Databases](#databases)
//! - [Torrent](#torrent)
//! - [Whitelist](#whitelist)
//!
//! # Introduction
//!
//! The tracker only serves the users and the torrents registered on the site.
//! Users authenticate with the passkey in the request path. The site keeps the
//! tracker lists up to date with `update` requests and reads the statistics
//! with `report` requests.
//!
//! The swarms live in memory. Every transfer counter, swarm snapshot, peer
//! record and snatch is buffered and written to the site database in batches.
//!
//! # Configuration
//!
//! You can control the behavior of this crate with the `Core` settings:
//!
//! ```toml
//! [core.announce_policy]
//! interval = 1800
//! max_interval_bonus = 600
//! numwant_limit = 50
//!
//! [core.tracker_policy]
//! peers_timeout = 7200
//! del_reason_lifetime = 86400
//! reap_peers_interval = 1800
//!
//! [core.database]
//! driver = "sqlite3"
//! path = "./storage/tracker/lib/database/sqlite3.db"
//! readonly = false
//!
//! [core.write_buffer]
//! schedule_interval = 3
//! peer_queue_limit = 1000
//! retry_backoff = 3
//!
//! [core.secrets]
//! site_password = "00000000000000000000000000000000"
//! report_password = "00000000000000000000000000000000"
//!
//! [core.site]
//! token_batch_threshold = 350
//! ```
//!
//! Refer to the `swarm-tracker-configuration` crate docs to get more
//! information about all options.
//!
//! # Request handler
//!
//! The [`RequestHandler`](request_handler::RequestHandler) takes the raw bytes
//! of a request and returns the response. Every service it needs is wired by
//! the [`TrackerCoreContainer`](container::TrackerCoreContainer).
//!
//! # Databases
//!
//! The tracker reads its lists from the database with the
//! [`Loader`](loader::Loader) and writes through the
//! [`WriteBuffers`](databases::pipeline::WriteBuffers).
//!
//! Please refer to the [`databases`] documentation.
//!
//! # Torrent
//!
//! The `Torrent` module keeps the swarms of the registered torrents.
//!
//! Please refer to the [`torrent`] documentation.
//!
//! # Whitelist
//!
//! Only clients whose peer id starts with a whitelisted prefix may announce.
//!
//! Please refer to the [`whitelist`] documentation.
pub mod announce_handler;
pub mod container;
pub mod databases;
pub mod deletion_reasons;
pub mod error;
pub mod loader;
pub mod reaper;
pub mod report_handler;
pub mod request_handler;
pub mod scrape_handler;
pub mod statistics;
pub mod status;
pub mod token_expiry;
pub mod torrent;
pub mod update_handler;
pub mod users;
pub mod whitelist;

pub mod test_helpers;

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
