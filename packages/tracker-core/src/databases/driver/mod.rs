//! Database driver factory and SQL dialects.
//!
//! The flush workers send complete statements to the store. Both drivers
//! understand the same `INSERT ... VALUES (...), (...)` batches; they only
//! differ in how an upsert is spelled:
//!
//! | Driver    | Upsert                                                     |
//! |-----------|------------------------------------------------------------|
//! | `Sqlite3` | `ON CONFLICT (key) DO UPDATE SET col = col + excluded.col` |
//! | `MySQL`   | `ON DUPLICATE KEY UPDATE col = col + VALUES(col)`          |
//!
//! See [`databases::driver::build`](crate::databases::driver::build) to get a
//! driver.
use mysql::Mysql;
use serde::{Deserialize, Serialize};
use sqlite::Sqlite;

use super::error::Error;
use super::Database;

pub mod mysql;
pub mod sqlite;

/// The database management system used by the tracker.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, derive_more::Display, Clone, Copy)]
pub enum Driver {
    /// The Sqlite3 database driver.
    Sqlite3,
    /// The `MySQL` database driver.
    MySQL,
}

impl Driver {
    /// Quotes a string literal for this dialect.
    #[must_use]
    pub fn quote(self, value: &str) -> String {
        let escaped = match self {
            Driver::Sqlite3 => value.replace('\'', "''"),
            Driver::MySQL => value
                .replace('\\', "\\\\")
                .replace('\'', "\\'")
                .replace('\0', "\\0"),
        };

        format!("'{escaped}'")
    }

    /// Adds the transferred bytes to the users.
    #[must_use]
    pub fn upsert_users(self, values: &str) -> String {
        let head = format!("INSERT INTO users (id, uploaded, downloaded) VALUES {values}");

        match self {
            Driver::Sqlite3 => format!(
                "{head} ON CONFLICT (id) DO UPDATE SET \
                 uploaded = uploaded + excluded.uploaded, \
                 downloaded = downloaded + excluded.downloaded"
            ),
            Driver::MySQL => format!(
                "{head} ON DUPLICATE KEY UPDATE \
                 uploaded = uploaded + VALUES(uploaded), \
                 downloaded = downloaded + VALUES(downloaded)"
            ),
        }
    }

    /// Overwrites the swarm size and balance of the torrents and adds the
    /// snatches. `last_action` is only moved while the torrent has seeders.
    #[must_use]
    pub fn upsert_torrents(self, values: &str) -> String {
        let head = format!("INSERT INTO torrents (id, seeders, leechers, snatched, balance) VALUES {values}");

        match self {
            Driver::Sqlite3 => format!(
                "{head} ON CONFLICT (id) DO UPDATE SET \
                 seeders = excluded.seeders, \
                 leechers = excluded.leechers, \
                 snatched = snatched + excluded.snatched, \
                 balance = excluded.balance, \
                 last_action = CASE WHEN excluded.seeders > 0 \
                 THEN CAST(strftime('%s', 'now') AS INTEGER) ELSE last_action END"
            ),
            Driver::MySQL => format!(
                "{head} ON DUPLICATE KEY UPDATE \
                 seeders = VALUES(seeders), \
                 leechers = VALUES(leechers), \
                 snatched = snatched + VALUES(snatched), \
                 balance = VALUES(balance), \
                 last_action = IF(VALUES(seeders) > 0, UNIX_TIMESTAMP(), last_action)"
            ),
        }
    }

    /// Snapshots of torrents deleted in the store meanwhile create rows
    /// without info-hash. This statement removes them.
    #[must_use]
    pub fn delete_orphan_torrents(self) -> String {
        "DELETE FROM torrents WHERE info_hash = ''".to_string()
    }

    #[must_use]
    pub fn upsert_heavy_peers(self, values: &str) -> String {
        let head = format!(
            "INSERT INTO peers (uid, fid, active, uploaded, downloaded, upspeed, downspeed, remaining, corrupt, \
             timespent, announced, ip, peer_id, useragent, mtime) VALUES {values}"
        );

        let columns = [
            "active",
            "uploaded",
            "downloaded",
            "upspeed",
            "downspeed",
            "remaining",
            "corrupt",
            "timespent",
            "announced",
            "ip",
            "useragent",
            "mtime",
        ];

        self.overwrite(&head, "uid, fid, peer_id", &columns, &[])
    }

    /// Light rows only move the announce bookkeeping forward. The speeds are
    /// zeroed because nothing was transferred that counts.
    #[must_use]
    pub fn upsert_light_peers(self, values: &str) -> String {
        let head = format!("INSERT INTO peers (uid, fid, timespent, announced, peer_id, mtime) VALUES {values}");

        self.overwrite(
            &head,
            "uid, fid, peer_id",
            &["timespent", "announced", "mtime"],
            &["upspeed = 0", "downspeed = 0"],
        )
    }

    #[must_use]
    pub fn insert_snatches(self, values: &str) -> String {
        format!("INSERT INTO snatches (uid, fid, tstamp, ip) VALUES {values}")
    }

    /// Adds the bytes downloaded with a free-leech token.
    #[must_use]
    pub fn upsert_tokens(self, values: &str) -> String {
        let head = format!("INSERT INTO user_tokens (user_id, torrent_id, downloaded) VALUES {values}");

        match self {
            Driver::Sqlite3 => format!(
                "{head} ON CONFLICT (user_id, torrent_id) DO UPDATE SET downloaded = downloaded + excluded.downloaded"
            ),
            Driver::MySQL => format!("{head} ON DUPLICATE KEY UPDATE downloaded = downloaded + VALUES(downloaded)"),
        }
    }

    fn overwrite(self, head: &str, key: &str, columns: &[&str], fixed: &[&str]) -> String {
        let assignments: Vec<String> = fixed
            .iter()
            .map(ToString::to_string)
            .chain(columns.iter().map(|column| match self {
                Driver::Sqlite3 => format!("{column} = excluded.{column}"),
                Driver::MySQL => format!("{column} = VALUES({column})"),
            }))
            .collect();

        match self {
            Driver::Sqlite3 => format!("{head} ON CONFLICT ({key}) DO UPDATE SET {}", assignments.join(", ")),
            Driver::MySQL => format!("{head} ON DUPLICATE KEY UPDATE {}", assignments.join(", ")),
        }
    }
}

impl From<swarm_tracker_configuration::Driver> for Driver {
    fn from(driver: swarm_tracker_configuration::Driver) -> Self {
        match driver {
            swarm_tracker_configuration::Driver::Sqlite3 => Driver::Sqlite3,
            swarm_tracker_configuration::Driver::MySQL => Driver::MySQL,
        }
    }
}

/// It builds a new database driver.
///
/// Example for `SQLite3`:
///
/// ```text
/// use bittorrent_tracker_core::databases;
/// use bittorrent_tracker_core::databases::driver::Driver;
///
/// let db_driver = Driver::Sqlite3;
/// let db_path = "./storage/tracker/lib/database/sqlite3.db".to_string();
/// let database = databases::driver::build(db_driver, &db_path);
/// ```
///
/// > **WARNING**: The driver instantiation creates the tables that don't exist.
///
/// # Errors
///
/// Will return `Error` if unable to build the driver.
///
/// # Panics
///
/// Will panic if unable to create database tables.
pub(crate) fn build(driver: Driver, db_path: &str) -> Result<Box<dyn Database>, Error> {
    let database: Box<dyn Database> = match driver {
        Driver::Sqlite3 => Box::new(Sqlite::new(db_path)?),
        Driver::MySQL => Box::new(Mysql::new(db_path)?),
    };

    database.create_database_tables().expect("Could not create database tables.");

    Ok(database)
}
