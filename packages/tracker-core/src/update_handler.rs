//! Update handler.
//!
//! The site keeps the tracker in sync with its own database through the
//! `update` action. Requests are authenticated with the site password before
//! they reach this handler.
//!
//! The change is selected with the `action` param:
//!
//! | `action`                   | Params                                    |
//! |----------------------------|-------------------------------------------|
//! | `change_passkey`           | `oldpasskey`, `newpasskey`                |
//! | `add_torrent`              | `info_hash`, `id`, `freetorrent`          |
//! | `update_torrent`           | `info_hash`, `freetorrent`                |
//! | `update_torrents`          | `info_hashes`, `freetorrent`              |
//! | `add_token`                | `info_hash`, `userid`                     |
//! | `remove_token`             | `info_hash`, `userid`                     |
//! | `delete_torrent`           | `info_hash`, `reason`                     |
//! | `add_user`                 | `passkey`, `id`, `visible`                |
//! | `remove_user`              | `passkey`                                 |
//! | `remove_users`             | `passkeys`                                |
//! | `update_user`              | `passkey`, `can_leech`, `visible`         |
//! | `add_whitelist`            | `peer_id`                                 |
//! | `remove_whitelist`         | `peer_id`                                 |
//! | `edit_whitelist`           | `old_peer_id`, `new_peer_id`              |
//! | `update_announce_interval` | `new_announce_interval`                   |
//! | `info_torrent`             | `info_hash`                               |
//!
//! Unknown actions and changes to unknown torrents or users are ignored. The
//! response is always `success`.
use std::sync::Arc;

use bittorrent_http_protocol::percent_encoding::{bintohex, hex_decode};
use bittorrent_http_protocol::v1::query::Query;
use bittorrent_http_protocol::v1::request::PASSKEY_LENGTH;
use bittorrent_http_protocol::v1::responses::Response;
use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::{FreeLeech, UserId};
use tracing::{info, instrument, warn};

use crate::announce_handler::AnnounceHandler;
use crate::deletion_reasons::NO_REASON;
use crate::torrent::manager::TorrentsManager;
use crate::torrent::repository::in_memory::InMemoryTorrentRepository;
use crate::users::Users;
use crate::whitelist::manager::WhitelistManager;

pub const SUCCESS: &str = "success";

pub struct UpdateHandler {
    users: Arc<Users>,
    in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,
    torrents_manager: Arc<TorrentsManager>,
    whitelist_manager: Arc<WhitelistManager>,
    announce_handler: Arc<AnnounceHandler>,
}

impl UpdateHandler {
    #[must_use]
    pub fn new(
        users: &Arc<Users>,
        in_memory_torrent_repository: &Arc<InMemoryTorrentRepository>,
        torrents_manager: &Arc<TorrentsManager>,
        whitelist_manager: &Arc<WhitelistManager>,
        announce_handler: &Arc<AnnounceHandler>,
    ) -> Self {
        Self {
            users: users.clone(),
            in_memory_torrent_repository: in_memory_torrent_repository.clone(),
            torrents_manager: torrents_manager.clone(),
            whitelist_manager: whitelist_manager.clone(),
            announce_handler: announce_handler.clone(),
        }
    }

    /// Applies the change requested by the site.
    #[instrument(skip(self, query), fields(action = query.get_param_str("action").unwrap_or_default()))]
    pub async fn update(&self, query: &Query) -> Response {
        let param = |name: &str| query.get_param_str(name).unwrap_or_default();

        match param("action").as_str() {
            "change_passkey" => {
                let (old_passkey, new_passkey) = (param("oldpasskey"), param("newpasskey"));
                if !self.users.change_passkey(&old_passkey, &new_passkey) {
                    warn!("no user with passkey {old_passkey} exists when attempting to change passkey to {new_passkey}");
                }
            }
            "add_torrent" => {
                if let Some(info_hash) = info_hash(query, "info_hash") {
                    let free_leech = FreeLeech::from_flag(&param("freetorrent"));
                    let torrent_id = self
                        .in_memory_torrent_repository
                        .add_torrent(info_hash, integer(query, "id"), free_leech);
                    info!("added torrent {torrent_id}, FL: {free_leech:?}");
                }
            }
            "update_torrent" => {
                let free_leech = FreeLeech::from_flag(&param("freetorrent"));
                if let Some(info_hash) = info_hash(query, "info_hash") {
                    self.set_free_leech(&info_hash, free_leech);
                }
            }
            "update_torrents" => {
                let free_leech = FreeLeech::from_flag(&param("freetorrent"));
                let info_hashes = query.get_param("info_hashes").map(hex_decode).unwrap_or_default();

                for chunk in info_hashes.chunks_exact(20) {
                    self.set_free_leech(&InfoHash::from_bytes(chunk), free_leech);
                }
            }
            "add_token" => {
                let user_id: UserId = integer(query, "userid");
                let added = info_hash(query, "info_hash")
                    .is_some_and(|info_hash| self.in_memory_torrent_repository.add_token(&info_hash, user_id));
                if !added {
                    warn!("failed to find torrent to add a token for user {user_id}");
                }
            }
            "remove_token" => {
                let user_id: UserId = integer(query, "userid");
                let removed = info_hash(query, "info_hash")
                    .is_some_and(|info_hash| self.in_memory_torrent_repository.remove_token(&info_hash, user_id));
                if !removed {
                    warn!("failed to find torrent to remove the token of user {user_id}");
                }
            }
            "delete_torrent" => {
                let reason = query
                    .get_param_integer("reason")
                    .map_or(NO_REASON, |reason| i32::try_from(reason).unwrap_or(NO_REASON));
                if let Some(info_hash) = info_hash(query, "info_hash") {
                    self.torrents_manager.delete_torrent(&info_hash, reason);
                }
            }
            "add_user" => {
                let protect_ip = param("visible") == "0";
                self.users.add(&param("passkey"), integer(query, "id"), protect_ip);
            }
            "remove_user" => {
                self.users.remove(&param("passkey"));
            }
            "remove_users" => {
                let passkeys = param("passkeys");
                for passkey in passkeys.as_bytes().chunks(PASSKEY_LENGTH) {
                    self.users.remove(&String::from_utf8_lossy(passkey));
                }
            }
            "update_user" => {
                let passkey = param("passkey");
                let can_leech = param("can_leech") != "0";
                let protect_ip = param("visible") == "0";
                if !self.users.update(&passkey, can_leech, protect_ip) {
                    warn!("no user with passkey {passkey} found when attempting to change leeching status");
                }
            }
            "add_whitelist" => {
                self.whitelist_manager.add_client(&prefix(query, "peer_id")).await;
            }
            "remove_whitelist" => {
                self.whitelist_manager.remove_client(&prefix(query, "peer_id")).await;
            }
            "edit_whitelist" => {
                self.whitelist_manager
                    .edit_client(&prefix(query, "old_peer_id"), &prefix(query, "new_peer_id"))
                    .await;
            }
            "update_announce_interval" => {
                let interval = u32::try_from(integer::<i64>(query, "new_announce_interval")).unwrap_or_default();
                self.announce_handler.update_announce_interval(interval);
            }
            "info_torrent" => {
                let info_hash_hex = param("info_hash");
                info!("info for torrent '{info_hash_hex}'");
                match info_hash(query, "info_hash").and_then(|info_hash| self.in_memory_torrent_repository.get(&info_hash)) {
                    Some(entry) => {
                        let torrent = entry.lock();
                        info!(
                            "torrent {}, freetorrent = {:?}, seeders = {}, leechers = {}",
                            torrent.id,
                            torrent.free_leech,
                            torrent.seeders.len(),
                            torrent.leechers.len()
                        );
                    }
                    None => warn!("failed to find torrent {info_hash_hex}"),
                }
            }
            unknown => warn!("unknown update action '{unknown}'"),
        }

        Response::plain(SUCCESS)
    }

    fn set_free_leech(&self, info_hash: &InfoHash, free_leech: FreeLeech) {
        match self.in_memory_torrent_repository.set_free_leech(info_hash, free_leech) {
            Some(torrent_id) => info!("updated torrent {torrent_id} to FL {free_leech:?}"),
            None => warn!("failed to find torrent {} to FL {free_leech:?}", bintohex(&info_hash.bytes())),
        }
    }
}

/// The decoded info-hash. Values that are not 20 bytes long can't match a torrent.
fn info_hash(query: &Query, name: &str) -> Option<InfoHash> {
    let bytes = hex_decode(query.get_param(name)?);

    (bytes.len() == 20).then(|| InfoHash::from_bytes(&bytes))
}

/// Client prefixes are kept as sent, like the ones loaded from the store.
fn prefix(query: &Query, name: &str) -> Vec<u8> {
    query.get_param(name).map(<[u8]>::to_vec).unwrap_or_default()
}

/// Missing values and values that don't fit are zero.
fn integer<T: TryFrom<i64> + Default>(query: &Query, name: &str) -> T {
    query
        .get_param_integer(name)
        .and_then(|value| T::try_from(value).ok())
        .unwrap_or_default()
}
