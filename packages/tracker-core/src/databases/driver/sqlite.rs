//! The `SQLite3` database driver.
use std::str::FromStr;

use bittorrent_primitives::info_hash::InfoHash;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use swarm_tracker_primitives::FreeLeech;

use super::{Database, Driver, Error};
use crate::databases::records::{TokenRow, TorrentRow, UserRow};

const DRIVER: Driver = Driver::Sqlite3;

pub struct Sqlite {
    pool: Pool<SqliteConnectionManager>,
}

impl Sqlite {
    /// It instantiates a new `SQLite3` database driver.
    ///
    /// # Errors
    ///
    /// Will return `r2d2::Error` if `db_path` is not able to create `SqLite` database.
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = r2d2::Pool::builder().build(manager).map_err(|e| (e, DRIVER))?;

        Ok(Self { pool })
    }
}

impl Database for Sqlite {
    fn create_database_tables(&self) -> Result<(), Error> {
        let create_torrents_table = "
        CREATE TABLE IF NOT EXISTS torrents (
            id INTEGER PRIMARY KEY,
            info_hash TEXT NOT NULL DEFAULT '',
            free_torrent TEXT NOT NULL DEFAULT '0',
            snatched INTEGER NOT NULL DEFAULT 0,
            seeders INTEGER NOT NULL DEFAULT 0,
            leechers INTEGER NOT NULL DEFAULT 0,
            balance INTEGER NOT NULL DEFAULT 0,
            last_action INTEGER NOT NULL DEFAULT 0
        );";

        let create_users_table = "
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            passkey TEXT NOT NULL DEFAULT '',
            can_leech INTEGER NOT NULL DEFAULT 1,
            visible INTEGER NOT NULL DEFAULT 1,
            enabled INTEGER NOT NULL DEFAULT 1,
            uploaded INTEGER NOT NULL DEFAULT 0,
            downloaded INTEGER NOT NULL DEFAULT 0
        );";

        let create_user_tokens_table = "
        CREATE TABLE IF NOT EXISTS user_tokens (
            user_id INTEGER NOT NULL,
            torrent_id INTEGER NOT NULL,
            downloaded INTEGER NOT NULL DEFAULT 0,
            expired INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, torrent_id)
        );";

        let create_peers_table = "
        CREATE TABLE IF NOT EXISTS peers (
            uid INTEGER NOT NULL,
            fid INTEGER NOT NULL,
            active INTEGER NOT NULL DEFAULT 0,
            uploaded INTEGER NOT NULL DEFAULT 0,
            downloaded INTEGER NOT NULL DEFAULT 0,
            upspeed INTEGER NOT NULL DEFAULT 0,
            downspeed INTEGER NOT NULL DEFAULT 0,
            remaining INTEGER NOT NULL DEFAULT 0,
            corrupt INTEGER NOT NULL DEFAULT 0,
            timespent INTEGER NOT NULL DEFAULT 0,
            announced INTEGER NOT NULL DEFAULT 0,
            ip TEXT NOT NULL DEFAULT '',
            peer_id TEXT NOT NULL,
            useragent TEXT NOT NULL DEFAULT '',
            mtime INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (uid, fid, peer_id)
        );";

        let create_snatches_table = "
        CREATE TABLE IF NOT EXISTS snatches (
            uid INTEGER NOT NULL,
            fid INTEGER NOT NULL,
            tstamp INTEGER NOT NULL,
            ip TEXT NOT NULL DEFAULT ''
        );";

        let create_client_whitelist_table = "
        CREATE TABLE IF NOT EXISTS client_whitelist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            peer_id TEXT NOT NULL UNIQUE
        );";

        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.execute(create_torrents_table, [])?;
        conn.execute(create_users_table, [])?;
        conn.execute(create_user_tokens_table, [])?;
        conn.execute(create_peers_table, [])?;
        conn.execute(create_snatches_table, [])?;
        conn.execute(create_client_whitelist_table, [])?;

        Ok(())
    }

    fn drop_database_tables(&self) -> Result<(), Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.execute("DROP TABLE torrents;", [])
            .and_then(|_| conn.execute("DROP TABLE users;", []))
            .and_then(|_| conn.execute("DROP TABLE user_tokens;", []))
            .and_then(|_| conn.execute("DROP TABLE peers;", []))
            .and_then(|_| conn.execute("DROP TABLE snatches;", []))
            .and_then(|_| conn.execute("DROP TABLE client_whitelist;", []))?;

        Ok(())
    }

    fn driver(&self) -> Driver {
        DRIVER
    }

    fn clear_peer_data(&self) -> Result<(), Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.execute("DELETE FROM peers", [])?;
        conn.execute("UPDATE torrents SET seeders = 0, leechers = 0", [])?;

        Ok(())
    }

    fn load_torrents(&self) -> Result<Vec<TorrentRow>, Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let mut stmt = conn.prepare("SELECT id, info_hash, free_torrent, snatched FROM torrents ORDER BY id")?;

        let torrent_iter = stmt.query_map([], |row| {
            let id: u32 = row.get(0)?;
            let info_hash: String = row.get(1)?;
            let free_torrent: String = row.get(2)?;
            let completed: u32 = row.get(3)?;
            Ok((id, info_hash, free_torrent, completed))
        })?;

        Ok(torrent_iter
            .filter_map(std::result::Result::ok)
            .filter_map(|(id, info_hash, free_torrent, completed)| torrent_row(id, &info_hash, &free_torrent, completed))
            .collect())
    }

    fn load_users(&self) -> Result<Vec<UserRow>, Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let mut stmt = conn.prepare("SELECT id, passkey, can_leech, visible FROM users WHERE enabled = 1 ORDER BY id")?;

        let user_iter = stmt.query_map([], |row| {
            let can_leech: i64 = row.get(2)?;
            let visible: i64 = row.get(3)?;
            Ok(UserRow {
                id: row.get(0)?,
                passkey: row.get(1)?,
                can_leech: can_leech != 0,
                protect_ip: visible == 0,
            })
        })?;

        Ok(user_iter.filter_map(std::result::Result::ok).collect())
    }

    fn load_tokens(&self) -> Result<Vec<TokenRow>, Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let mut stmt = conn.prepare(
            "SELECT ut.user_id, t.info_hash FROM user_tokens AS ut \
             JOIN torrents AS t ON t.id = ut.torrent_id WHERE ut.expired = 0",
        )?;

        let token_iter = stmt.query_map([], |row| {
            let user_id: u32 = row.get(0)?;
            let info_hash: String = row.get(1)?;
            Ok((user_id, info_hash))
        })?;

        Ok(token_iter
            .filter_map(std::result::Result::ok)
            .filter_map(|(user_id, info_hash)| InfoHash::from_str(&info_hash).ok().map(|info_hash| (user_id, info_hash)))
            .collect())
    }

    fn load_whitelist(&self) -> Result<Vec<String>, Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let mut stmt = conn.prepare("SELECT peer_id FROM client_whitelist")?;

        let prefix_iter = stmt.query_map([], |row| row.get::<_, String>(0))?;

        Ok(prefix_iter.filter_map(std::result::Result::ok).collect())
    }

    fn execute(&self, statement: &str) -> Result<(), Error> {
        let conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.execute_batch(statement)?;

        Ok(())
    }
}

/// Builds a torrent row. Rows without a valid info-hash are skipped with a
/// warning.
pub(super) fn torrent_row(id: u32, info_hash: &str, free_torrent: &str, completed: u32) -> Option<TorrentRow> {
    match InfoHash::from_str(info_hash) {
        Ok(info_hash) => Some(TorrentRow {
            id,
            info_hash,
            free_leech: FreeLeech::from_stored(free_torrent),
            completed,
        }),
        Err(_) => {
            tracing::warn!(torrent_id = id, "skipping torrent with an invalid info-hash: {info_hash:?}");
            None
        }
    }
}
