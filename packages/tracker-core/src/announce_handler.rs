//! Announce handler.
//!
//! Handling `announce` requests is the most important task for a `BitTorrent`
//! tracker.
//!
//! A peer announces itself to the swarm of a torrent to report its progress
//! and to get the addresses of other peers. A private tracker also uses the
//! announces to account the bytes every user transferred, so the handler:
//!
//! 1. Validates the request: the torrent must be registered, the client must
//!    ask for compact peer lists, send a 20 bytes peer id, be whitelisted and
//!    have a routable address.
//! 2. Places the peer in the leechers or the seeders of the torrent and
//!    updates its counters, crediting the transfer since the last announce
//!    according to the free-leech policy of the torrent.
//! 3. Buffers the records for the store: user deltas, peer rows, snatches,
//!    token usage and torrent snapshots.
//! 4. Picks the peers for the response.
//!
//! Everything but the whitelist check happens under the lock of the torrent
//! entry, so announces to the same torrent are serialized while announces to
//! different torrents run in parallel.
//!
//! The response is a bencoded dictionary:
//!
//! ```text
//! d8:completei<seeders>e10:downloadedi<snatches>e10:incompletei<leechers>e
//!  8:intervali<seconds>e12:min intervali<seconds>e5:peers<compact IPv4 peers>
//!  [6:peers6<compact IPv6 peers>]e
//! ```
//!
//! ## Related BEPs:
//!
//! - [BEP 3. The `BitTorrent` Protocol Specification](https://www.bittorrent.org/beps/bep_0003.html)
//! - [BEP 7. IPv6 Tracker Extension](https://www.bittorrent.org/beps/bep_0007.html)
//! - [BEP 23. Tracker Returns Compact Peer Lists](https://www.bittorrent.org/beps/bep_0023.html)
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aquatic_udp_protocol::{AnnounceEvent, PeerId};
use bittorrent_http_protocol::ip::{is_routable_ipv4, is_routable_ipv6};
use bittorrent_http_protocol::percent_encoding::{bintohex, hex_decode};
use bittorrent_http_protocol::v1::requests::announce::Announce;
use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_clock::clock::Time;
use swarm_tracker_configuration::Core;
use swarm_tracker_primitives::peer::{Peer, PeerKey};
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;
use swarm_tracker_primitives::user::User;
use swarm_tracker_primitives::{DurationSinceUnixEpoch, FreeLeech};
use swarm_tracker_torrent_repository::entry::{PeerList, Requester, SelectedPeers};
use swarm_tracker_torrent_repository::{Torrent, TorrentEntry};
use tracing::{debug, info, instrument};

use crate::databases::pipeline::WriteBuffers;
use crate::databases::records::{HeavyPeer, LightPeer, Snatch, TokenUsage, TorrentSnapshot, UserDelta};
use crate::deletion_reasons::{reason_text, DeletionReasons};
use crate::error::RequestError;
use crate::statistics::Metrics;
use crate::token_expiry::TokenExpiry;
use crate::torrent::repository::in_memory::InMemoryTorrentRepository;
use crate::whitelist::authorization::WhitelistAuthorization;
use crate::CurrentClock;

/// A torrent snapshot is written at least this often while it has announces.
const SNAPSHOT_MAX_AGE: Duration = Duration::from_secs(3600);

/// What the transport knows about the client.
#[derive(Debug, Clone, Copy)]
pub struct ClientInfo<'a> {
    /// The address of the connection.
    pub remote_ip: IpAddr,
    pub x_forwarded_for: Option<&'a str>,
    pub user_agent: &'a str,
}

/// The data for the announce response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceData {
    pub stats: SwarmMetadata,
    pub interval: u32,
    pub min_interval: u32,
    pub peers: SelectedPeers,
}

/// The addresses of the announcing peer. At least one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddresses {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Leechers,
    Seeders,
}

/// Pending changes of the live peer counters.
#[derive(Debug, Default, Clone, Copy)]
struct CounterChanges {
    inc_leechers: bool,
    inc_seeders: bool,
    dec_leechers: bool,
    dec_seeders: bool,
}

impl CounterChanges {
    fn apply(&self, owner: &User, metrics: &Metrics) {
        let mut leechers = 0;
        let mut seeders = 0;

        if self.inc_leechers {
            owner.incr_leeching();
            leechers += 1;
        }
        if self.inc_seeders {
            owner.incr_seeding();
            seeders += 1;
        }
        if self.dec_leechers {
            owner.decr_leeching();
            leechers -= 1;
        }
        if self.dec_seeders {
            owner.decr_seeding();
            seeders -= 1;
        }

        metrics.add_peers(leechers, seeders);
    }
}

/// Handles `announce` requests from `BitTorrent` clients.
pub struct AnnounceHandler {
    /// The tracker configuration.
    config: Core,

    /// Base announce interval. The site can change it while running.
    announce_interval: AtomicU32,

    in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,

    deletion_reasons: Arc<DeletionReasons>,

    whitelist_authorization: Arc<WhitelistAuthorization>,

    write_buffers: Arc<WriteBuffers>,

    token_expiry: Arc<dyn TokenExpiry>,

    metrics: Arc<Metrics>,
}

impl AnnounceHandler {
    #[must_use]
    pub fn new(
        config: &Core,
        in_memory_torrent_repository: &Arc<InMemoryTorrentRepository>,
        deletion_reasons: &Arc<DeletionReasons>,
        whitelist_authorization: &Arc<WhitelistAuthorization>,
        write_buffers: &Arc<WriteBuffers>,
        token_expiry: &Arc<dyn TokenExpiry>,
        metrics: &Arc<Metrics>,
    ) -> Self {
        Self {
            config: config.clone(),
            announce_interval: AtomicU32::new(config.announce_policy.interval),
            in_memory_torrent_repository: in_memory_torrent_repository.clone(),
            deletion_reasons: deletion_reasons.clone(),
            whitelist_authorization: whitelist_authorization.clone(),
            write_buffers: write_buffers.clone(),
            token_expiry: token_expiry.clone(),
            metrics: metrics.clone(),
        }
    }

    #[must_use]
    pub fn announce_interval(&self) -> u32 {
        self.announce_interval.load(Ordering::Relaxed)
    }

    pub fn update_announce_interval(&self, seconds: u32) {
        self.announce_interval.store(seconds, Ordering::Relaxed);
        info!("edited announce interval to {seconds}");
    }

    /// Processes an announce request from a peer of `user`.
    ///
    /// # Errors
    ///
    /// Will return a [`RequestError`] when the request is rejected. Requests
    /// that fail validation leave the swarm untouched. `AccessDenied` is the
    /// exception: the announce of a user that can't leech is fully accounted
    /// before it's rejected.
    #[instrument(skip(self, user, announce, client), fields(user_id = user.id()), err)]
    pub async fn announce(
        &self,
        user: &Arc<User>,
        announce: &Announce,
        client: &ClientInfo<'_>,
    ) -> Result<AnnounceData, RequestError> {
        let (info_hash, entry) = self.registered_torrent(&announce.info_hash)?;

        if !announce.compact {
            return Err(RequestError::UnsupportedClient);
        }

        let peer_id = match announce.peer_id.as_deref().map(<[u8; 20]>::try_from) {
            Some(Ok(peer_id)) => PeerId(peer_id),
            _ => return Err(RequestError::InvalidPeerId),
        };

        self.whitelist_authorization.authorize(&peer_id).await?;

        let addresses = resolve_addresses(announce, client)?;

        let now = Duration::from_secs(CurrentClock::now().as_secs());

        let mut torrent = entry.lock();

        // Deleted while this request was waiting for the lock.
        if torrent.is_retired() {
            return Err(self.unregistered(&info_hash));
        }

        self.update_swarm(&mut torrent, user, announce, peer_id, addresses, client.user_agent, now)
    }

    fn registered_torrent(&self, info_hash: &[u8]) -> Result<(InfoHash, TorrentEntry), RequestError> {
        if info_hash.len() != 20 {
            return Err(RequestError::UnregisteredTorrent { reason: None });
        }

        let info_hash = InfoHash::from_bytes(info_hash);

        match self.in_memory_torrent_repository.get(&info_hash) {
            Some(entry) => Ok((info_hash, entry)),
            None => Err(self.unregistered(&info_hash)),
        }
    }

    fn unregistered(&self, info_hash: &InfoHash) -> RequestError {
        RequestError::UnregisteredTorrent {
            reason: self
                .deletion_reasons
                .get(info_hash)
                .map(|deleted| reason_text(deleted.code).to_string()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[allow(clippy::too_many_lines)]
    fn update_swarm(
        &self,
        torrent: &mut Torrent,
        user: &Arc<User>,
        announce: &Announce,
        peer_id: PeerId,
        addresses: PeerAddresses,
        user_agent: &str,
        now: DurationSinceUnixEpoch,
    ) -> Result<AnnounceData, RequestError> {
        let left = announce.left.max(0);
        let uploaded = announce.uploaded.max(0);
        let downloaded = announce.downloaded.max(0);
        let corrupt = announce.corrupt.max(0);

        let stopped = announce.event == AnnounceEvent::Stopped;
        let mut completed = announce.event == AnnounceEvent::Completed && left == 0;

        let mut changes = CounterChanges::default();
        let mut peer_changed = stopped;
        let mut update_torrent = stopped;
        let mut expire_token = false;

        let key = PeerKey::new(torrent.id, user.id(), &peer_id);

        // The peer is taken out of its list and put back into the right one
        // once it's updated. Nothing else sees the lists meanwhile.
        let (mut bucket, existing) = if left > 0 {
            let existing = torrent.leechers.remove(&key);
            changes.inc_leechers = existing.is_none();
            (Bucket::Leechers, existing)
        } else if completed {
            if torrent.leechers.contains_key(&key) {
                if torrent.seeders.remove(&key).is_some() {
                    changes.dec_seeders = true;
                }
                (Bucket::Leechers, torrent.leechers.remove(&key))
            } else if let Some(seeder) = torrent.seeders.remove(&key) {
                // Already seeding: not a snatch.
                completed = false;
                (Bucket::Seeders, Some(seeder))
            } else {
                changes.inc_seeders = true;
                (Bucket::Seeders, None)
            }
        } else if let Some(seeder) = torrent.seeders.remove(&key) {
            (Bucket::Seeders, Some(seeder))
        } else if let Some(leecher) = torrent.leechers.remove(&key) {
            peer_changed = true;
            changes.dec_leechers = true;
            changes.inc_seeders = true;
            (Bucket::Seeders, Some(leecher))
        } else {
            changes.inc_seeders = true;
            (Bucket::Seeders, None)
        };

        let inserted = existing.is_none();
        let mut peer = existing.unwrap_or_else(|| Peer::new(peer_id, user));

        let mut upspeed = 0;
        let mut downspeed = 0;

        if inserted || announce.event == AnnounceEvent::Started {
            update_torrent = true;
            peer_changed = true;
            peer.first_announced = now;
            peer.last_announced = DurationSinceUnixEpoch::ZERO;
            peer.uploaded = uploaded;
            peer.downloaded = downloaded;
            peer.corrupt = corrupt;
            peer.announces = 1;
        } else if uploaded < peer.uploaded || downloaded < peer.downloaded {
            // The client restarted its counters. Nothing is credited.
            peer_changed = true;
            peer.announces = peer.announces.saturating_add(1);
            peer.uploaded = uploaded;
            peer.downloaded = downloaded;
        } else {
            peer.announces = peer.announces.saturating_add(1);

            let uploaded_change = uploaded - peer.uploaded;
            let downloaded_change = downloaded - peer.downloaded;
            let corrupt_change = corrupt - peer.corrupt;

            peer.uploaded = uploaded;
            peer.downloaded = downloaded;
            peer.corrupt = corrupt;

            if corrupt_change != 0 {
                torrent.balance -= corrupt_change;
                update_torrent = true;
            }

            peer_changed = peer_changed || uploaded_change != 0 || downloaded_change != 0 || corrupt_change != 0;

            if uploaded_change != 0 || downloaded_change != 0 {
                update_torrent = true;

                let elapsed = now.saturating_sub(peer.last_announced).as_secs();
                if elapsed > 0 {
                    let elapsed = i64::try_from(elapsed).unwrap_or(i64::MAX);
                    upspeed = uploaded_change / elapsed;
                    downspeed = downloaded_change / elapsed;
                }

                let (credited_upload, credited_download) =
                    self.apply_free_leech(torrent, user, uploaded_change, downloaded_change, &mut expire_token);

                torrent.balance += credited_upload - credited_download;

                if credited_upload != 0 || credited_download != 0 {
                    self.write_buffers.record_user(&UserDelta {
                        user_id: user.id(),
                        uploaded: credited_upload,
                        downloaded: credited_download,
                    });
                }
            }
        }

        peer.left = left;
        peer.set_endpoint(addresses.ipv4, addresses.ipv6, announce.port);
        peer.last_announced = now;
        peer.visible = left == 0 || user.can_leech();

        let recorded_ip = if user.is_protected() { String::new() } else { peer.ip_string() };

        if peer_changed {
            self.write_buffers.record_heavy_peer(&HeavyPeer {
                user_id: user.id(),
                torrent_id: torrent.id,
                active: !stopped,
                uploaded,
                downloaded,
                upspeed,
                downspeed,
                left,
                corrupt,
                time_spent: peer.time_spent(),
                announces: peer.announces,
                ip: recorded_ip.clone(),
                peer_id: bintohex(&peer_id.0),
                user_agent: user_agent.to_string(),
                mtime: now.as_secs(),
            });
        } else {
            self.write_buffers.record_light_peer(&LightPeer {
                user_id: user.id(),
                torrent_id: torrent.id,
                time_spent: peer.time_spent(),
                announces: peer.announces,
                peer_id: bintohex(&peer_id.0),
                mtime: now.as_secs(),
            });
        }

        let numwant_limit = i64::from(self.config.announce_policy.numwant_limit);
        let mut numwant = announce
            .numwant
            .map_or(numwant_limit, |numwant| numwant.min(numwant_limit))
            .max(0);

        let mut snatched = 0;

        if stopped {
            numwant = 0;
            if left > 0 {
                changes.dec_leechers = true;
            } else {
                changes.dec_seeders = true;
            }
        } else if completed {
            snatched = 1;
            update_torrent = true;
            torrent.completed = torrent.completed.saturating_add(1);

            self.write_buffers.record_snatch(&Snatch {
                user_id: user.id(),
                torrent_id: torrent.id,
                time: now.as_secs(),
                ip: recorded_ip,
            });

            if !inserted {
                bucket = Bucket::Seeders;
                changes.dec_leechers = true;
                changes.inc_seeders = true;
            }

            // The expiry was sent when the token was consulted.
            if expire_token {
                torrent.tokened_users.remove(&user.id());
            }
        } else if !user.can_leech() && left > 0 {
            numwant = 0;
        }

        // The counters follow the user the peer belonged to, then move to
        // the user announcing now if the passkey changed owner.
        let owner = peer.user.clone();
        changes.apply(&owner, &self.metrics);

        if !Arc::ptr_eq(&owner, user) {
            if !stopped {
                if left > 0 {
                    user.incr_leeching();
                    owner.decr_leeching();
                } else {
                    user.incr_seeding();
                    owner.decr_seeding();
                }
            }
            peer.user = user.clone();
        }

        let requester = Requester {
            user_id: user.id(),
            is_seeder: left == 0,
            has_ipv6: peer.ipv6.is_some(),
            compact_ipv4: peer.compact_ipv4,
        };

        // A stopped peer is dropped here.
        if !stopped {
            peers_mut(torrent, bucket).insert(key, peer);
        }

        let peers = torrent.select_peers(&requester, usize::try_from(numwant).unwrap_or_default());

        self.metrics.succ_announcements.fetch_add(1, Ordering::Relaxed);

        if update_torrent || torrent.last_flushed + SNAPSHOT_MAX_AGE < now {
            torrent.last_flushed = now;

            self.write_buffers.record_torrent(&TorrentSnapshot {
                torrent_id: torrent.id,
                seeders: torrent.seeders.len(),
                leechers: torrent.leechers.len(),
                snatched,
                balance: torrent.balance,
            });
        }

        if !user.can_leech() && left > 0 {
            return Err(RequestError::AccessDenied);
        }

        debug!(
            torrent_id = torrent.id,
            seeders = torrent.seeders.len(),
            leechers = torrent.leechers.len(),
            peers = peers.count,
            "announce handled"
        );

        let stats = torrent.get_swarm_metadata();
        let announce_interval = self.announce_interval();

        Ok(AnnounceData {
            interval: announce_interval + self.config.announce_policy.max_interval_bonus.min(stats.complete),
            min_interval: announce_interval,
            stats,
            peers,
        })
    }

    /// Applies the free-leech policy of the torrent to the transfer. It
    /// returns the credited upload and download.
    ///
    /// A consulted token is recorded with the bytes it covered and its expiry
    /// is sent to the site.
    fn apply_free_leech(
        &self,
        torrent: &Torrent,
        user: &User,
        uploaded_change: i64,
        downloaded_change: i64,
        expire_token: &mut bool,
    ) -> (i64, i64) {
        if torrent.free_leech == FreeLeech::Neutral {
            return (0, 0);
        }

        let has_token = torrent.tokened_users.contains(&user.id());

        if has_token {
            *expire_token = true;
            self.write_buffers.record_token(&TokenUsage {
                user_id: user.id(),
                torrent_id: torrent.id,
                downloaded: downloaded_change,
            });
            self.token_expiry.expire_token(torrent.id, user.id());
        }

        if has_token || torrent.free_leech == FreeLeech::Free {
            (uploaded_change, 0)
        } else {
            (uploaded_change, downloaded_change)
        }
    }
}

fn peers_mut(torrent: &mut Torrent, bucket: Bucket) -> &mut PeerList {
    match bucket {
        Bucket::Leechers => &mut torrent.leechers,
        Bucket::Seeders => &mut torrent.seeders,
    }
}

/// Resolves the addresses of the announcing peer.
///
/// The address of the connection is the default for its family. A client
/// may override one family with, in order of precedence, the `ip`, `ipv4`
/// or `ipv6` params or the first address of the `X-Forwarded-For` header.
/// Addresses that are not globally routable are discarded.
///
/// # Errors
///
/// Will return `RequestError::InvalidIp` if no address is left.
pub fn resolve_addresses(announce: &Announce, client: &ClientInfo<'_>) -> Result<PeerAddresses, RequestError> {
    let (mut ipv4, mut ipv6) = match client.remote_ip.to_canonical() {
        IpAddr::V4(ip) => (Some(ip.to_string().into_bytes()), None),
        IpAddr::V6(ip) => (None, Some(ip.to_string().into_bytes())),
    };

    let mut override_sniffed = |candidate: Vec<u8>| {
        if is_ipv4_literal(&candidate) {
            ipv4 = Some(candidate);
        } else {
            ipv6 = Some(candidate);
        }
    };

    if let Some(ip) = &announce.ip {
        override_sniffed(ip.clone());
    } else if let Some(ip) = &announce.ipv4 {
        ipv4 = Some(ip.clone());
    } else if let Some(ip) = &announce.ipv6 {
        ipv6 = Some(ip.clone());
    } else if let Some(forwarded) = client.x_forwarded_for {
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        override_sniffed(first.as_bytes().to_vec());
    }

    let addresses = PeerAddresses {
        ipv4: ipv4
            .and_then(|raw| parse_literal::<Ipv4Addr>(&raw))
            .filter(|ip| is_routable_ipv4(*ip)),
        ipv6: ipv6
            .and_then(|raw| parse_literal::<Ipv6Addr>(&raw))
            .filter(|ip| is_routable_ipv6(*ip)),
    };

    if addresses.ipv4.is_none() && addresses.ipv6.is_none() {
        return Err(RequestError::InvalidIp);
    }

    Ok(addresses)
}

fn is_ipv4_literal(raw: &[u8]) -> bool {
    parse_literal::<IpAddr>(raw).is_some_and(|ip| ip.is_ipv4())
}

fn parse_literal<T: std::str::FromStr>(raw: &[u8]) -> Option<T> {
    std::str::from_utf8(&hex_decode(raw)).ok()?.trim().parse::<T>().ok()
}

#[cfg(test)]
mod tests {

    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use aquatic_udp_protocol::AnnounceEvent;
    use bittorrent_http_protocol::v1::requests::announce::Announce;
    use swarm_tracker_configuration::Core;
    use swarm_tracker_primitives::user::User;
    use swarm_tracker_primitives::FreeLeech;

    use super::{AnnounceHandler, ClientInfo};
    use crate::databases::pipeline::WriteBuffers;
    use crate::databases::setup::initialize_database;
    use crate::deletion_reasons::DeletionReasons;
    use crate::statistics::Metrics;
    use crate::test_helpers::tests::{ephemeral_configuration, sample_info_hash};
    use crate::token_expiry::{MockTokenExpiry, TokenExpiry};
    use crate::torrent::repository::in_memory::InMemoryTorrentRepository;
    use crate::whitelist::authorization::WhitelistAuthorization;
    use crate::whitelist::repository::in_memory::InMemoryWhitelist;

    struct AnnounceHandlerDeps {
        in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,
        in_memory_whitelist: Arc<InMemoryWhitelist>,
        deletion_reasons: Arc<DeletionReasons>,
        write_buffers: Arc<WriteBuffers>,
        metrics: Arc<Metrics>,
    }

    fn initialize_handler_with(config: &Core, token_expiry: MockTokenExpiry) -> (AnnounceHandler, AnnounceHandlerDeps) {
        let database = initialize_database(config);
        let in_memory_torrent_repository = Arc::new(InMemoryTorrentRepository::default());
        let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
        let whitelist_authorization = Arc::new(WhitelistAuthorization::new(&in_memory_whitelist));
        let deletion_reasons = Arc::new(DeletionReasons::default());
        let write_buffers = Arc::new(WriteBuffers::new(config, &database));
        let token_expiry: Arc<dyn TokenExpiry> = Arc::new(token_expiry);
        let metrics = Arc::new(Metrics::default());

        let announce_handler = AnnounceHandler::new(
            config,
            &in_memory_torrent_repository,
            &deletion_reasons,
            &whitelist_authorization,
            &write_buffers,
            &token_expiry,
            &metrics,
        );

        in_memory_torrent_repository.add_torrent(sample_info_hash(), 1, FreeLeech::Normal);

        (
            announce_handler,
            AnnounceHandlerDeps {
                in_memory_torrent_repository,
                in_memory_whitelist,
                deletion_reasons,
                write_buffers,
                metrics,
            },
        )
    }

    fn initialize_handler() -> (AnnounceHandler, AnnounceHandlerDeps) {
        initialize_handler_with(&ephemeral_configuration(), MockTokenExpiry::new())
    }

    fn client() -> ClientInfo<'static> {
        ClientInfo {
            remote_ip: IpAddr::V4(Ipv4Addr::new(126, 0, 0, 1)),
            x_forwarded_for: None,
            user_agent: "qBittorrent/4.6.0",
        }
    }

    fn client_from(remote_ip: Ipv4Addr) -> ClientInfo<'static> {
        ClientInfo {
            remote_ip: IpAddr::V4(remote_ip),
            ..client()
        }
    }

    /// A valid announce of a leecher with 100 bytes left.
    fn sample_announce(peer_id: &[u8; 20]) -> Announce {
        Announce {
            info_hash: sample_info_hash().bytes().to_vec(),
            peer_id: Some(peer_id.to_vec()),
            port: 6881,
            uploaded: 0,
            downloaded: 0,
            left: 100,
            corrupt: 0,
            event: AnnounceEvent::Started,
            compact: true,
            numwant: None,
            ip: None,
            ipv4: None,
            ipv6: None,
        }
    }

    fn seeder_announce(peer_id: &[u8; 20]) -> Announce {
        Announce {
            left: 0,
            ..sample_announce(peer_id)
        }
    }

    fn sample_user(user_id: u32) -> Arc<User> {
        Arc::new(User::new(user_id, true, false))
    }

    mod validating_the_request {
        use bittorrent_primitives::info_hash::InfoHash;

        use super::{client, initialize_handler, sample_announce, sample_user};
        use crate::error::RequestError;
        use crate::test_helpers::tests::sample_info_hash;

        #[tokio::test]
        async fn it_should_reject_unregistered_torrents() {
            let (announce_handler, _deps) = initialize_handler();

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.info_hash = InfoHash::from_bytes(&[7u8; 20]).bytes().to_vec();

            let result = announce_handler.announce(&sample_user(1), &announce, &client()).await;

            assert_eq!(result, Err(RequestError::UnregisteredTorrent { reason: None }));
        }

        #[tokio::test]
        async fn it_should_give_the_reason_a_torrent_was_deleted() {
            let (announce_handler, deps) = initialize_handler();
            deps.in_memory_torrent_repository.remove(&sample_info_hash());
            deps.deletion_reasons.record(sample_info_hash(), 0);

            let result = announce_handler
                .announce(&sample_user(1), &sample_announce(b"-qB00000000000000001"), &client())
                .await;

            assert_eq!(result.unwrap_err().to_string(), "Unregistered torrent: Dupe");
        }

        #[tokio::test]
        async fn it_should_reject_non_compact_announces() {
            let (announce_handler, _deps) = initialize_handler();

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.compact = false;

            let result = announce_handler.announce(&sample_user(1), &announce, &client()).await;

            assert_eq!(result, Err(RequestError::UnsupportedClient));
        }

        #[tokio::test]
        async fn it_should_reject_peer_ids_that_are_not_20_bytes_long() {
            let (announce_handler, _deps) = initialize_handler();

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.peer_id = Some(b"-qB0000".to_vec());

            let result = announce_handler.announce(&sample_user(1), &announce, &client()).await;

            assert_eq!(result, Err(RequestError::InvalidPeerId));
        }

        #[tokio::test]
        async fn it_should_reject_clients_that_are_not_whitelisted() {
            let (announce_handler, deps) = initialize_handler();
            deps.in_memory_whitelist.add(b"-TR").await;

            let result = announce_handler
                .announce(&sample_user(1), &sample_announce(b"-qB00000000000000001"), &client())
                .await;

            assert_eq!(result, Err(RequestError::NotWhitelisted));
        }

        #[tokio::test]
        async fn it_should_not_touch_the_swarm_when_the_request_is_rejected() {
            let (announce_handler, deps) = initialize_handler();

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.compact = false;
            let user = sample_user(1);

            let _ = announce_handler.announce(&user, &announce, &client()).await;

            assert_eq!(user.leeching(), 0);
            let entry = deps.in_memory_torrent_repository.get(&sample_info_hash()).unwrap();
            assert!(!entry.lock().has_peers());
        }

        #[tokio::test]
        async fn it_should_reject_announces_without_a_routable_address() {
            let (announce_handler, deps) = initialize_handler();

            let result = announce_handler
                .announce(
                    &sample_user(1),
                    &sample_announce(b"-qB00000000000000001"),
                    &super::client_from(std::net::Ipv4Addr::new(192, 168, 1, 10)),
                )
                .await;

            assert_eq!(result, Err(RequestError::InvalidIp));
            let entry = deps.in_memory_torrent_repository.get(&sample_info_hash()).unwrap();
            assert!(!entry.lock().has_peers());
        }
    }

    mod placing_the_peer {
        use std::sync::atomic::Ordering;

        use aquatic_udp_protocol::AnnounceEvent;

        use super::{client, initialize_handler, sample_announce, sample_user, seeder_announce};
        use crate::test_helpers::tests::sample_info_hash;

        #[tokio::test]
        async fn it_should_add_a_new_leecher() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);

            let announce_data = announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            assert_eq!(announce_data.stats.incomplete, 1);
            assert_eq!(announce_data.stats.complete, 0);
            assert_eq!(user.leeching(), 1);
            assert_eq!(deps.metrics.leechers.load(Ordering::Relaxed), 1);
        }

        #[tokio::test]
        async fn it_should_add_a_new_seeder() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);

            let announce_data = announce_handler
                .announce(&user, &seeder_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            assert_eq!(announce_data.stats.complete, 1);
            assert_eq!(user.seeding(), 1);
            assert_eq!(deps.metrics.seeders.load(Ordering::Relaxed), 1);
        }

        #[tokio::test]
        async fn it_should_migrate_a_leecher_that_finished_without_the_completed_event() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            let mut announce = seeder_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::None;
            let announce_data = announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!((announce_data.stats.complete, announce_data.stats.incomplete), (1, 0));
            assert_eq!(announce_data.stats.downloaded, 0);
            assert_eq!((user.leeching(), user.seeding()), (0, 1));
            assert_eq!(deps.metrics.leechers.load(Ordering::Relaxed), 0);
            assert_eq!(deps.metrics.seeders.load(Ordering::Relaxed), 1);
        }

        #[tokio::test]
        async fn it_should_count_a_snatch_when_a_leecher_completes() {
            let (announce_handler, _deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            let mut announce = seeder_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::Completed;
            let announce_data = announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(announce_data.stats.downloaded, 1);
            assert_eq!((announce_data.stats.complete, announce_data.stats.incomplete), (1, 0));
            assert_eq!((user.leeching(), user.seeding()), (0, 1));
        }

        #[tokio::test]
        async fn it_should_not_count_a_snatch_for_a_peer_that_was_already_seeding() {
            let (announce_handler, _deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &seeder_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            let mut announce = seeder_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::Completed;
            let announce_data = announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(announce_data.stats.downloaded, 0);
            assert_eq!(user.seeding(), 1);
        }

        #[tokio::test]
        async fn it_should_collapse_a_peer_found_in_both_lists_into_a_seeder_when_it_completes() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &seeder_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();
            announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();
            assert_eq!((user.leeching(), user.seeding()), (1, 1));

            let mut announce = seeder_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::Completed;
            let announce_data = announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!((announce_data.stats.complete, announce_data.stats.incomplete), (1, 0));
            assert_eq!((user.leeching(), user.seeding()), (0, 1));
            assert_eq!(deps.metrics.seeders.load(Ordering::Relaxed), 1);
            assert_eq!(deps.metrics.leechers.load(Ordering::Relaxed), 0);
        }

        #[tokio::test]
        async fn it_should_remove_a_stopped_peer_after_accounting_it() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::Stopped;
            let announce_data = announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(announce_data.stats.incomplete, 0);
            assert_eq!(announce_data.peers.count, 0);
            assert_eq!(user.leeching(), 0);
            assert_eq!(deps.metrics.leechers.load(Ordering::Relaxed), 0);
            let entry = deps.in_memory_torrent_repository.get(&sample_info_hash()).unwrap();
            assert!(!entry.lock().has_peers());
        }

        #[tokio::test]
        async fn it_should_not_count_a_peer_that_is_stopped_before_it_was_known() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);

            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::Stopped;
            announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(user.leeching(), 0);
            assert_eq!(deps.metrics.leechers.load(Ordering::Relaxed), 0);
        }

        #[tokio::test]
        async fn it_should_move_the_live_count_to_the_new_owner_of_a_peer() {
            let (announce_handler, _deps) = initialize_handler();
            let previous_owner = sample_user(1);
            announce_handler
                .announce(&previous_owner, &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            // Same user id and peer id, but the user was reloaded.
            let new_owner = sample_user(1);
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::None;
            announce_handler.announce(&new_owner, &announce, &client()).await.unwrap();

            assert_eq!(previous_owner.leeching(), 0);
            assert_eq!(new_owner.leeching(), 1);
        }
    }

    mod crediting_the_transfer {
        use std::time::Duration;

        use aquatic_udp_protocol::AnnounceEvent;
        use swarm_tracker_clock::clock::Stopped;
        use swarm_tracker_primitives::FreeLeech;

        use super::{client, initialize_handler, initialize_handler_with, sample_announce, sample_user};
        use crate::test_helpers::tests::{ephemeral_configuration, sample_info_hash};
        use crate::token_expiry::MockTokenExpiry;

        fn balance(deps: &super::AnnounceHandlerDeps) -> i64 {
            deps.in_memory_torrent_repository
                .get(&sample_info_hash())
                .unwrap()
                .lock()
                .balance
        }

        fn reannounce(uploaded: i64, downloaded: i64) -> bittorrent_http_protocol::v1::requests::announce::Announce {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.event = AnnounceEvent::None;
            announce.uploaded = uploaded;
            announce.downloaded = downloaded;
            announce
        }

        #[tokio::test]
        async fn it_should_credit_the_net_transfer_to_the_torrent_balance() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            announce_handler.announce(&user, &reannounce(500, 200), &client()).await.unwrap();

            assert_eq!(balance(&deps), 300);
        }

        #[tokio::test]
        async fn it_should_not_credit_downloads_on_free_torrents() {
            let (announce_handler, deps) = initialize_handler();
            deps.in_memory_torrent_repository
                .set_free_leech(&sample_info_hash(), FreeLeech::Free);
            let user = sample_user(1);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            announce_handler.announce(&user, &reannounce(500, 200), &client()).await.unwrap();

            assert_eq!(balance(&deps), 500);
        }

        #[tokio::test]
        async fn it_should_not_credit_anything_on_neutral_torrents() {
            let (announce_handler, deps) = initialize_handler();
            deps.in_memory_torrent_repository
                .set_free_leech(&sample_info_hash(), FreeLeech::Neutral);
            let user = sample_user(1);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();
            let buffered = deps.write_buffers.buffered();

            announce_handler.announce(&user, &reannounce(500, 200), &client()).await.unwrap();

            assert_eq!(balance(&deps), 0);
            // heavy peer and torrent snapshot, no user delta
            assert_eq!(deps.write_buffers.buffered(), buffered + 2);
        }

        #[tokio::test]
        async fn it_should_not_credit_anything_when_the_counters_go_backwards() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();
            announce_handler.announce(&user, &reannounce(500, 200), &client()).await.unwrap();

            announce_handler.announce(&user, &reannounce(100, 200), &client()).await.unwrap();
            announce_handler.announce(&user, &reannounce(150, 200), &client()).await.unwrap();

            assert_eq!(balance(&deps), 350);
        }

        #[tokio::test]
        async fn it_should_subtract_corrupt_bytes_from_the_balance() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            let mut announce = reannounce(0, 0);
            announce.corrupt = 64;
            announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(balance(&deps), -64);
        }

        #[tokio::test]
        async fn it_should_compute_the_transfer_speed_since_the_last_announce() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            Stopped::local_set(&Duration::from_secs(1_000));
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();
            announce_handler.announce(&user, &reannounce(0, 0), &client()).await.unwrap();

            Stopped::local_add(&Duration::from_secs(10));
            announce_handler.announce(&user, &reannounce(1000, 50), &client()).await.unwrap();

            let heavy_peers = deps.write_buffers.buffered_heavy_peers();
            let row = heavy_peers.last().unwrap();
            // uid, tid, active, uploaded, downloaded, upspeed, downspeed, left, corrupt, timespent, announces
            assert!(row.starts_with("(1, 1, 1, 1000, 50, 100, 5, 100, 0, 10, 3, "), "{row}");
        }

        #[tokio::test]
        async fn it_should_not_compute_a_speed_when_no_time_went_by() {
            let (announce_handler, deps) = initialize_handler();
            let user = sample_user(1);
            Stopped::local_set(&Duration::from_secs(1_000));
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            announce_handler.announce(&user, &reannounce(1000, 50), &client()).await.unwrap();

            let heavy_peers = deps.write_buffers.buffered_heavy_peers();
            let row = heavy_peers.last().unwrap();
            assert!(row.starts_with("(1, 1, 1, 1000, 50, 0, 0, "), "{row}");
        }

        #[tokio::test]
        async fn it_should_record_and_expire_a_token_used_to_download_a_free_torrent() {
            let mut token_expiry = MockTokenExpiry::new();
            token_expiry
                .expect_expire_token()
                .withf(|torrent_id, user_id| *torrent_id == 1 && *user_id == 7)
                .times(1)
                .return_const(());
            let (announce_handler, deps) = initialize_handler_with(&ephemeral_configuration(), token_expiry);
            deps.in_memory_torrent_repository
                .set_free_leech(&sample_info_hash(), FreeLeech::Free);
            deps.in_memory_torrent_repository.add_token(&sample_info_hash(), 7);
            let user = sample_user(7);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            announce_handler.announce(&user, &reannounce(0, 1000), &client()).await.unwrap();

            assert_eq!(balance(&deps), 0);
            assert_eq!(deps.write_buffers.buffered_tokens(), vec!["(7, 1, 1000)".to_string()]);
        }

        #[tokio::test]
        async fn it_should_consume_the_token_of_a_user_completing_a_torrent() {
            let mut token_expiry = MockTokenExpiry::new();
            token_expiry
                .expect_expire_token()
                .withf(|torrent_id, user_id| *torrent_id == 1 && *user_id == 7)
                .times(1)
                .return_const(());
            let (announce_handler, deps) = initialize_handler_with(&ephemeral_configuration(), token_expiry);
            deps.in_memory_torrent_repository.add_token(&sample_info_hash(), 7);
            let user = sample_user(7);
            announce_handler.announce(&user, &sample_announce(b"-qB00000000000000001"), &client()).await.unwrap();

            let mut announce = reannounce(0, 100);
            announce.left = 0;
            announce.event = AnnounceEvent::Completed;
            announce_handler.announce(&user, &announce, &client()).await.unwrap();

            assert_eq!(balance(&deps), 0);
            let entry = deps.in_memory_torrent_repository.get(&sample_info_hash()).unwrap();
            assert!(!entry.lock().tokened_users.contains(&7));
        }
    }

    mod answering_the_peer {
        use std::net::Ipv4Addr;

        use swarm_tracker_primitives::user::User;

        use super::{
            client, client_from, initialize_handler, initialize_handler_with, sample_announce, sample_user, seeder_announce,
        };
        use crate::error::RequestError;
        use crate::test_helpers::tests::ephemeral_configuration;
        use crate::token_expiry::MockTokenExpiry;

        #[tokio::test]
        async fn it_should_give_seeders_to_a_leecher() {
            let (announce_handler, _deps) = initialize_handler();
            announce_handler
                .announce(
                    &sample_user(1),
                    &seeder_announce(b"-qB00000000000000001"),
                    &client_from(Ipv4Addr::new(126, 0, 0, 1)),
                )
                .await
                .unwrap();

            let announce_data = announce_handler
                .announce(
                    &sample_user(2),
                    &sample_announce(b"-qB00000000000000002"),
                    &client_from(Ipv4Addr::new(126, 0, 0, 2)),
                )
                .await
                .unwrap();

            assert_eq!(announce_data.peers.count, 1);
            assert_eq!(announce_data.peers.ipv4, vec![126, 0, 0, 1, 0x1A, 0xE1]);
        }

        #[tokio::test]
        async fn it_should_never_give_a_peer_its_own_user() {
            let (announce_handler, _deps) = initialize_handler();
            let user = sample_user(1);
            announce_handler
                .announce(&user, &seeder_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            let announce_data = announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000002"), &client())
                .await
                .unwrap();

            assert_eq!(announce_data.peers.count, 0);
        }

        #[tokio::test]
        async fn it_should_limit_the_peers_to_the_numwant_param() {
            let (announce_handler, _deps) = initialize_handler();
            for user_id in 1..=3u8 {
                let mut peer_id = *b"-qB00000000000000000";
                peer_id[19] = b'0' + user_id;
                announce_handler
                    .announce(
                        &sample_user(u32::from(user_id)),
                        &seeder_announce(&peer_id),
                        &client_from(Ipv4Addr::new(126, 0, 0, user_id)),
                    )
                    .await
                    .unwrap();
            }

            let mut announce = sample_announce(b"-qB00000000000000009");
            announce.numwant = Some(2);
            let announce_data = announce_handler.announce(&sample_user(9), &announce, &client()).await.unwrap();

            assert_eq!(announce_data.peers.count, 2);
        }

        #[tokio::test]
        async fn it_should_add_a_bonus_of_one_second_per_seeder_to_the_interval() {
            let mut config = ephemeral_configuration();
            config.announce_policy.interval = 1800;
            let (announce_handler, _deps) = initialize_handler_with(&config, MockTokenExpiry::new());

            let announce_data = announce_handler
                .announce(&sample_user(1), &seeder_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            assert_eq!(announce_data.interval, 1801);
            assert_eq!(announce_data.min_interval, 1800);
        }

        #[tokio::test]
        async fn it_should_use_the_announce_interval_changed_by_the_site() {
            let (announce_handler, _deps) = initialize_handler();

            announce_handler.update_announce_interval(900);
            let announce_data = announce_handler
                .announce(&sample_user(1), &sample_announce(b"-qB00000000000000001"), &client())
                .await
                .unwrap();

            assert_eq!(announce_data.min_interval, 900);
        }

        #[tokio::test]
        async fn it_should_deny_leeching_to_users_that_can_not_leech_after_accounting_the_announce() {
            let (announce_handler, deps) = initialize_handler();
            let user = std::sync::Arc::new(User::new(1, false, false));

            let result = announce_handler
                .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
                .await;

            assert_eq!(result, Err(RequestError::AccessDenied));
            assert_eq!(user.leeching(), 1);
            assert!(deps.write_buffers.buffered() > 0);
        }

        #[tokio::test]
        async fn it_should_let_users_that_can_not_leech_seed() {
            let (announce_handler, _deps) = initialize_handler();
            let user = std::sync::Arc::new(User::new(1, false, false));

            let result = announce_handler
                .announce(&user, &seeder_announce(b"-qB00000000000000001"), &client())
                .await;

            assert!(result.is_ok());
        }
    }

    mod resolving_the_peer_addresses {
        use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

        use super::{client, sample_announce, ClientInfo};
        use crate::announce_handler::{resolve_addresses, PeerAddresses};
        use crate::error::RequestError;

        #[test]
        fn it_should_use_the_address_of_the_connection_by_default() {
            let addresses = resolve_addresses(&sample_announce(b"-qB00000000000000001"), &client()).unwrap();

            assert_eq!(
                addresses,
                PeerAddresses {
                    ipv4: Some(Ipv4Addr::new(126, 0, 0, 1)),
                    ipv6: None
                }
            );
        }

        #[test]
        fn it_should_treat_an_ipv4_mapped_connection_address_as_ipv4() {
            let client = ClientInfo {
                remote_ip: IpAddr::V6(Ipv4Addr::new(126, 0, 0, 1).to_ipv6_mapped()),
                ..client()
            };

            let addresses = resolve_addresses(&sample_announce(b"-qB00000000000000001"), &client).unwrap();

            assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(126, 0, 0, 1)));
        }

        #[test]
        fn it_should_add_the_ipv6_address_reported_in_the_ip_param() {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.ip = Some(b"2001%3A4860%3A%3A1".to_vec());

            let addresses = resolve_addresses(&announce, &client()).unwrap();

            assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(126, 0, 0, 1)));
            assert_eq!(addresses.ipv6, Some("2001:4860::1".parse::<Ipv6Addr>().unwrap()));
        }

        #[test]
        fn it_should_replace_the_connection_address_with_the_reported_one_of_the_same_family() {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.ipv4 = Some(b"8.8.8.8".to_vec());

            let addresses = resolve_addresses(&announce, &client()).unwrap();

            assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(8, 8, 8, 8)));
        }

        #[test]
        fn it_should_use_the_first_forwarded_address() {
            let client = ClientInfo {
                remote_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                x_forwarded_for: Some(" 8.8.4.4 , 10.0.0.1"),
                user_agent: "",
            };

            let addresses = resolve_addresses(&sample_announce(b"-qB00000000000000001"), &client).unwrap();

            assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(8, 8, 4, 4)));
        }

        #[test]
        fn it_should_prefer_the_ip_param_over_the_forwarded_address() {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.ip = Some(b"1.1.1.1".to_vec());
            let client = ClientInfo {
                x_forwarded_for: Some("8.8.4.4"),
                ..client()
            };

            let addresses = resolve_addresses(&announce, &client).unwrap();

            assert_eq!(addresses.ipv4, Some(Ipv4Addr::new(1, 1, 1, 1)));
        }

        #[test]
        fn it_should_discard_private_addresses() {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.ipv4 = Some(b"192.168.0.2".to_vec());

            assert_eq!(resolve_addresses(&announce, &client()), Err(RequestError::InvalidIp));
        }

        #[test]
        fn it_should_discard_addresses_that_do_not_parse() {
            let mut announce = sample_announce(b"-qB00000000000000001");
            announce.ipv4 = Some(b"not-an-ip".to_vec());

            assert_eq!(resolve_addresses(&announce, &client()), Err(RequestError::InvalidIp));
        }
    }

    #[tokio::test]
    async fn it_should_buffer_a_heavy_peer_row_and_a_snapshot_for_a_new_peer() {
        let (announce_handler, deps) = initialize_handler();

        announce_handler
            .announce(&sample_user(1), &sample_announce(b"-qB00000000000000001"), &client())
            .await
            .unwrap();

        assert_eq!(deps.write_buffers.buffered(), 2);
    }

    #[tokio::test]
    async fn it_should_buffer_only_a_light_peer_row_for_an_idle_reannounce() {
        let (announce_handler, deps) = initialize_handler();
        let user = sample_user(1);
        announce_handler
            .announce(&user, &sample_announce(b"-qB00000000000000001"), &client())
            .await
            .unwrap();

        let mut announce = sample_announce(b"-qB00000000000000001");
        announce.event = AnnounceEvent::None;
        announce_handler.announce(&user, &announce, &client()).await.unwrap();

        assert_eq!(deps.write_buffers.buffered(), 3);
    }

    #[tokio::test]
    async fn it_should_count_the_successful_announces() {
        let (announce_handler, deps) = initialize_handler();

        announce_handler
            .announce(&sample_user(1), &sample_announce(b"-qB00000000000000001"), &client())
            .await
            .unwrap();

        assert_eq!(deps.metrics.succ_announcements.load(std::sync::atomic::Ordering::Relaxed), 1);
    }
}
