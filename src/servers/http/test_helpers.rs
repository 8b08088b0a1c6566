//! Some generic test helpers functions.
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bittorrent_primitives::info_hash::InfoHash;
use bittorrent_tracker_core::container::TrackerCoreContainer;
use bittorrent_tracker_core::token_expiry::{DisabledNotifier, TokenExpiry, TokenExpiryQueue};
use swarm_tracker_primitives::FreeLeech;
use swarm_tracker_test_helpers::configuration;

pub const PASSKEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// # Panics
///
/// Will panic if the string representation of the info hash is not a valid info hash.
#[must_use]
pub fn sample_info_hash() -> InfoHash {
    "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0" // DevSkim: ignore DS173237
        .parse::<InfoHash>()
        .expect("String should be a valid info hash")
}

#[must_use]
pub fn remote_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)), 51234)
}

/// A tracker with one user and one torrent.
#[must_use]
pub fn initialize_container() -> Arc<TrackerCoreContainer> {
    let core_config = Arc::new(configuration::ephemeral().core);
    let token_expiry: Arc<dyn TokenExpiry> = Arc::new(TokenExpiryQueue::new(&core_config, Arc::new(DisabledNotifier)));

    let container = Arc::new(TrackerCoreContainer::initialize(&core_config, token_expiry));

    container.users.add(PASSKEY, 1, false);
    container
        .in_memory_torrent_repository
        .add_torrent(sample_info_hash(), 1, FreeLeech::Normal);

    container
}

#[must_use]
pub fn announce_request(passkey: &str) -> Vec<u8> {
    let info_hash: String = sample_info_hash().bytes().iter().map(|byte| format!("%{byte:02x}")).collect();

    format!(
        "GET /{passkey}/announce?info_hash={info_hash}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100&compact=1 HTTP/1.1\r\nHost: tracker\r\n\r\n"
    )
    .into_bytes()
}
