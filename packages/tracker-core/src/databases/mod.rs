//! The persistence module.
//!
//! The tracker reads its lists from the store and writes aggregated deltas
//! back. It never reads what it wrote: the in-memory swarm is the source of
//! truth while the tracker runs.
//!
//! There are two implementations of the [`Database`] trait (two drivers):
//!
//! - **`MySQL`**
//! - **`Sqlite`**
//!
//! > **NOTICE**: There are no database migrations at this time. Tables that
//! > don't exist are created when the driver is built.
//!
//! # Tables
//!
//! | Table              | Read on load                                   | Written by the pipeline                       |
//! |--------------------|------------------------------------------------|-----------------------------------------------|
//! | `torrents`         | `id`, `info_hash`, `free_torrent`, `snatched`  | `seeders`, `leechers`, `snatched`, `balance`  |
//! | `users`            | `id`, `passkey`, `can_leech`, `visible`        | `uploaded`, `downloaded`                      |
//! | `user_tokens`      | `user_id`, `torrent_id` of unexpired tokens    | `downloaded`                                  |
//! | `client_whitelist` | `peer_id` prefixes                             |                                               |
//! | `peers`            |                                                | one row per peer, heavy or light              |
//! | `snatches`         |                                                | one row per completed download                |
//!
//! Info-hashes are stored as 40-char lowercase hex strings. Peer ids are
//! stored as hex too.
//!
//! Writes are not done one by one. The [`pipeline`] buffers records and the
//! flush workers of the [`queue`] module send them as batch statements.
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod records;
pub mod setup;

use mockall::automock;

use self::driver::Driver;
use self::error::Error;
use self::records::{TokenRow, TorrentRow, UserRow};

/// The persistence trait. It contains all the methods to interact with the
/// store.
#[automock]
pub trait Database: Sync + Send {
    /// It generates the database tables. SQL queries are hardcoded in the
    /// trait implementation.
    ///
    /// # Context: Schema
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to create own tables.
    fn create_database_tables(&self) -> Result<(), Error>;

    /// It drops the database tables.
    ///
    /// # Context: Schema
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to drop tables.
    fn drop_database_tables(&self) -> Result<(), Error>;

    /// The SQL dialect of the driver.
    fn driver(&self) -> Driver;

    /// Removes the peers written by a previous run and resets the swarm sizes.
    /// Live peers don't survive a restart.
    ///
    /// # Context: Bulk load
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to delete the peers.
    fn clear_peer_data(&self) -> Result<(), Error>;

    /// It loads the registered torrents. Rows with an invalid info-hash are
    /// skipped.
    ///
    /// # Context: Bulk load
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to load.
    fn load_torrents(&self) -> Result<Vec<TorrentRow>, Error>;

    /// It loads the enabled users.
    ///
    /// # Context: Bulk load
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to load.
    fn load_users(&self) -> Result<Vec<UserRow>, Error>;

    /// It loads the unexpired free-leech tokens.
    ///
    /// # Context: Bulk load
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to load.
    fn load_tokens(&self) -> Result<Vec<TokenRow>, Error>;

    /// It loads the peer id prefixes of the allowed clients.
    ///
    /// # Context: Bulk load
    ///
    /// # Errors
    ///
    /// Will return `Err` if unable to load.
    fn load_whitelist(&self) -> Result<Vec<String>, Error>;

    /// Executes a statement built by the write-buffer pipeline.
    ///
    /// # Context: Write-buffer pipeline
    ///
    /// # Errors
    ///
    /// Will return `Err` if the store rejects the statement or can't be
    /// reached.
    fn execute(&self, statement: &str) -> Result<(), Error>;
}
