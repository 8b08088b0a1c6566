//! End to end tests of the tracker application.
//!
//! They start the whole application on an ephemeral port and talk to it over
//! plain TCP, the way the BitTorrent clients and the site do.
use std::net::SocketAddr;
use std::sync::Arc;

use bittorrent_primitives::info_hash::InfoHash;
use bittorrent_tracker_core::container::TrackerCoreContainer;
use percent_encoding::{percent_encode, NON_ALPHANUMERIC};
use swarm_tracker::app::{self, Jobs};
use swarm_tracker::bootstrap::app::{initialize_app_container, load_data_from_database};
use swarm_tracker_configuration::Configuration;
use swarm_tracker_test_helpers::configuration::{self, REPORT_PASSWORD, SITE_PASSWORD};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const PASSKEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn sample_info_hash() -> InfoHash {
    "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0" // DevSkim: ignore DS173237
        .parse::<InfoHash>()
        .expect("String should be a valid info hash")
}

fn escaped_info_hash() -> String {
    percent_encode(&sample_info_hash().bytes(), NON_ALPHANUMERIC).to_string()
}

struct Env {
    container: Arc<TrackerCoreContainer>,
    jobs: Jobs,
}

impl Env {
    async fn start(config: Configuration) -> Self {
        let container = initialize_app_container(&config);
        load_data_from_database(&container).await;

        let jobs = app::start(&config, &container).await;

        Self { container, jobs }
    }

    fn local_addr(&self) -> SocketAddr {
        self.jobs.http_tracker.local_addr
    }

    async fn get(&self, path: &str) -> String {
        let mut stream = TcpStream::connect(self.local_addr()).await.unwrap();

        stream
            .write_all(format!("GET /{path} HTTP/1.1\r\nHost: tracker\r\nUser-Agent: qBittorrent/4.6.0\r\n\r\n").as_bytes())
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        response
    }

    async fn stop(self) {
        let Jobs {
            http_tracker,
            scheduler,
            reload,
        } = self.jobs;

        scheduler.abort();
        if let Some(reload) = reload {
            reload.abort();
        }
        http_tracker.stop().await.unwrap();
    }
}

fn body(response: &str) -> &str {
    response.split_once("\r\n\r\n").map_or("", |(_, body)| body)
}

async fn register_torrent_and_user(env: &Env) {
    let response = env
        .get(&format!(
            "{SITE_PASSWORD}/update?action=add_torrent&info_hash={}&id=1&freetorrent=0",
            escaped_info_hash()
        ))
        .await;
    assert_eq!(body(&response), "success");

    let response = env
        .get(&format!("{SITE_PASSWORD}/update?action=add_user&passkey={PASSKEY}&id=1"))
        .await;
    assert_eq!(body(&response), "success");
}

#[tokio::test]
async fn it_should_announce_a_peer_registered_by_the_site() {
    let env = Env::start(configuration::ephemeral()).await;
    register_torrent_and_user(&env).await;

    let response = env
        .get(&format!(
            "{PASSKEY}/announce?info_hash={}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100&compact=1&ip=126.0.0.1&event=started",
            escaped_info_hash()
        ))
        .await;

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
    assert!(response.contains("Content-Type: text/plain\r\n"), "{response}");
    assert!(body(&response).starts_with("d8:completei0e10:downloadedi0e10:incompletei1e"), "{response}");

    let response = env
        .get(&format!("{PASSKEY}/scrape?info_hash={}", escaped_info_hash()))
        .await;

    assert!(body(&response).starts_with("d5:filesd20:"), "{response}");
    assert!(body(&response).contains("10:incompletei1e"), "{response}");

    env.stop().await;
}

#[tokio::test]
async fn it_should_reject_an_announce_from_a_loopback_address() {
    let env = Env::start(configuration::ephemeral()).await;
    register_torrent_and_user(&env).await;

    let response = env
        .get(&format!(
            "{PASSKEY}/announce?info_hash={}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100&compact=1&event=started",
            escaped_info_hash()
        ))
        .await;

    assert!(body(&response).starts_with("d14:failure reason20:Invalid IP detected.12:"), "{response}");

    env.stop().await;
}

#[tokio::test]
async fn it_should_report_the_tracker_statistics() {
    let env = Env::start(configuration::ephemeral()).await;
    register_torrent_and_user(&env).await;

    env.get(&format!(
        "{PASSKEY}/announce?info_hash={}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100&compact=1&ip=126.0.0.1&event=started",
        escaped_info_hash()
    ))
    .await;

    let response = env.get(&format!("{REPORT_PASSWORD}/report?get=stats")).await;

    assert!(body(&response).starts_with("Uptime: "), "{response}");
    assert!(body(&response).contains("\n1 successful announcements\n"), "{response}");
    assert!(body(&response).contains("\n1 leechers tracked\n"), "{response}");

    env.stop().await;
}

#[tokio::test]
async fn it_should_reject_an_unknown_passkey() {
    let env = Env::start(configuration::ephemeral()).await;
    register_torrent_and_user(&env).await;

    let response = env
        .get(&format!(
            "{}/announce?info_hash={}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100",
            "b".repeat(32),
            escaped_info_hash()
        ))
        .await;

    assert!(body(&response).starts_with("d14:failure reason"), "{response}");
    assert!(body(&response).contains("Passkey not found"), "{response}");

    env.stop().await;
}

#[tokio::test]
async fn it_should_refuse_announces_once_the_tracker_is_closing() {
    let env = Env::start(configuration::ephemeral()).await;
    register_torrent_and_user(&env).await;

    env.container.status.shutdown();

    let response = env
        .get(&format!(
            "{PASSKEY}/announce?info_hash={}&peer_id=-qB4600-000000000001&port=6881&uploaded=0&downloaded=0&left=100",
            escaped_info_hash()
        ))
        .await;

    assert!(body(&response).contains("The tracker is temporarily unavailable."), "{response}");

    env.stop().await;
}
