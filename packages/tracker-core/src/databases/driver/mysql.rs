//! The `MySQL` database driver.
use std::str::FromStr;

use bittorrent_primitives::info_hash::InfoHash;
use r2d2::Pool;
use r2d2_mysql::mysql::prelude::Queryable;
use r2d2_mysql::mysql::{Opts, OptsBuilder};
use r2d2_mysql::MySqlConnectionManager;

use super::sqlite::torrent_row;
use super::{Database, Driver, Error};
use crate::databases::records::{TokenRow, TorrentRow, UserRow};

const DRIVER: Driver = Driver::MySQL;

pub struct Mysql {
    pool: Pool<MySqlConnectionManager>,
}

impl Mysql {
    /// It instantiates a new `MySQL` database driver.
    ///
    /// # Errors
    ///
    /// Will return `r2d2::Error` if `db_path` is not able to create `MySQL` database.
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let opts = Opts::from_url(db_path)?;
        let builder = OptsBuilder::from_opts(opts);
        let manager = MySqlConnectionManager::new(builder);
        let pool = r2d2::Pool::builder().build(manager).map_err(|e| (e, DRIVER))?;

        Ok(Self { pool })
    }
}

impl Database for Mysql {
    fn create_database_tables(&self) -> Result<(), Error> {
        let create_torrents_table = "
        CREATE TABLE IF NOT EXISTS `torrents` (
            `id` INT UNSIGNED NOT NULL,
            `info_hash` VARCHAR(40) NOT NULL DEFAULT '',
            `free_torrent` ENUM('0', '1', '2') NOT NULL DEFAULT '0',
            `snatched` INT UNSIGNED NOT NULL DEFAULT 0,
            `seeders` INT UNSIGNED NOT NULL DEFAULT 0,
            `leechers` INT UNSIGNED NOT NULL DEFAULT 0,
            `balance` BIGINT NOT NULL DEFAULT 0,
            `last_action` BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (`id`)
        );";

        let create_users_table = "
        CREATE TABLE IF NOT EXISTS `users` (
            `id` INT UNSIGNED NOT NULL,
            `passkey` CHAR(32) NOT NULL DEFAULT '',
            `can_leech` TINYINT(1) NOT NULL DEFAULT 1,
            `visible` TINYINT(1) NOT NULL DEFAULT 1,
            `enabled` TINYINT(1) NOT NULL DEFAULT 1,
            `uploaded` BIGINT NOT NULL DEFAULT 0,
            `downloaded` BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (`id`)
        );";

        let create_user_tokens_table = "
        CREATE TABLE IF NOT EXISTS `user_tokens` (
            `user_id` INT UNSIGNED NOT NULL,
            `torrent_id` INT UNSIGNED NOT NULL,
            `downloaded` BIGINT NOT NULL DEFAULT 0,
            `expired` TINYINT(1) NOT NULL DEFAULT 0,
            PRIMARY KEY (`user_id`, `torrent_id`)
        );";

        let create_peers_table = "
        CREATE TABLE IF NOT EXISTS `peers` (
            `uid` INT UNSIGNED NOT NULL,
            `fid` INT UNSIGNED NOT NULL,
            `active` TINYINT(1) NOT NULL DEFAULT 0,
            `uploaded` BIGINT NOT NULL DEFAULT 0,
            `downloaded` BIGINT NOT NULL DEFAULT 0,
            `upspeed` BIGINT NOT NULL DEFAULT 0,
            `downspeed` BIGINT NOT NULL DEFAULT 0,
            `remaining` BIGINT NOT NULL DEFAULT 0,
            `corrupt` BIGINT NOT NULL DEFAULT 0,
            `timespent` BIGINT UNSIGNED NOT NULL DEFAULT 0,
            `announced` INT UNSIGNED NOT NULL DEFAULT 0,
            `ip` VARCHAR(45) NOT NULL DEFAULT '',
            `peer_id` CHAR(40) NOT NULL,
            `useragent` VARCHAR(51) NOT NULL DEFAULT '',
            `mtime` BIGINT UNSIGNED NOT NULL DEFAULT 0,
            PRIMARY KEY (`uid`, `fid`, `peer_id`)
        );";

        let create_snatches_table = "
        CREATE TABLE IF NOT EXISTS `snatches` (
            `uid` INT UNSIGNED NOT NULL,
            `fid` INT UNSIGNED NOT NULL,
            `tstamp` BIGINT UNSIGNED NOT NULL,
            `ip` VARCHAR(45) NOT NULL DEFAULT '',
            KEY (`fid`)
        );";

        let create_client_whitelist_table = "
        CREATE TABLE IF NOT EXISTS `client_whitelist` (
            `id` INT NOT NULL AUTO_INCREMENT,
            `peer_id` VARCHAR(20) NOT NULL,
            PRIMARY KEY (`id`),
            UNIQUE (`peer_id`)
        );";

        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.query_drop(create_torrents_table)?;
        conn.query_drop(create_users_table)?;
        conn.query_drop(create_user_tokens_table)?;
        conn.query_drop(create_peers_table)?;
        conn.query_drop(create_snatches_table)?;
        conn.query_drop(create_client_whitelist_table)?;

        Ok(())
    }

    fn drop_database_tables(&self) -> Result<(), Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        for table in ["torrents", "users", "user_tokens", "peers", "snatches", "client_whitelist"] {
            conn.query_drop(format!("DROP TABLE `{table}`;"))?;
        }

        Ok(())
    }

    fn driver(&self) -> Driver {
        DRIVER
    }

    fn clear_peer_data(&self) -> Result<(), Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.query_drop("TRUNCATE `peers`")?;
        conn.query_drop("UPDATE `torrents` SET seeders = 0, leechers = 0")?;

        Ok(())
    }

    fn load_torrents(&self) -> Result<Vec<TorrentRow>, Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let rows = conn.query_map(
            "SELECT id, info_hash, free_torrent, snatched FROM torrents ORDER BY id",
            |(id, info_hash, free_torrent, completed): (u32, String, String, u32)| {
                torrent_row(id, &info_hash, &free_torrent, completed)
            },
        )?;

        Ok(rows.into_iter().flatten().collect())
    }

    fn load_users(&self) -> Result<Vec<UserRow>, Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let users = conn.query_map(
            "SELECT id, passkey, can_leech, visible FROM users WHERE enabled = 1 ORDER BY id",
            |(id, passkey, can_leech, visible): (u32, String, u8, u8)| UserRow {
                id,
                passkey,
                can_leech: can_leech != 0,
                protect_ip: visible == 0,
            },
        )?;

        Ok(users)
    }

    fn load_tokens(&self) -> Result<Vec<TokenRow>, Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let tokens = conn.query_map(
            "SELECT ut.user_id, t.info_hash FROM user_tokens AS ut \
             JOIN torrents AS t ON t.id = ut.torrent_id WHERE ut.expired = 0",
            |(user_id, info_hash): (u32, String)| InfoHash::from_str(&info_hash).ok().map(|info_hash| (user_id, info_hash)),
        )?;

        Ok(tokens.into_iter().flatten().collect())
    }

    fn load_whitelist(&self) -> Result<Vec<String>, Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        let prefixes = conn.query_map("SELECT peer_id FROM client_whitelist", |peer_id: String| peer_id)?;

        Ok(prefixes)
    }

    fn execute(&self, statement: &str) -> Result<(), Error> {
        let mut conn = self.pool.get().map_err(|e| (e, DRIVER))?;

        conn.query_drop(statement)?;

        Ok(())
    }
}
