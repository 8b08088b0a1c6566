//! Report handler.
//!
//! The `report` action exposes the tracker statistics to the site and to
//! monitoring. It's authenticated with the report password. The report is
//! selected with the `get` param:
//!
//! - `stats`: human readable counters, one `<value> <name>` per line.
//! - `prom_stats`: the same counters in the Prometheus text format.
//! - `user`: the live peers of the user with the passkey in the `key` param.
//!
//! Every report ends with `success`.
use std::fmt::Write;
use std::sync::Arc;

use bittorrent_http_protocol::v1::query::Query;
use bittorrent_http_protocol::v1::responses::Response;
use swarm_tracker_clock::conv::format_uptime;
use tracing::instrument;

use crate::statistics::{Metrics, MetricsSnapshot};
use crate::update_handler::SUCCESS;
use crate::users::Users;

/// Prefix of the Prometheus metric names.
pub const METRICS_PREFIX: &str = "swarm_tracker";

pub struct ReportHandler {
    users: Arc<Users>,
    metrics: Arc<Metrics>,
}

impl ReportHandler {
    #[must_use]
    pub fn new(users: &Arc<Users>, metrics: &Arc<Metrics>) -> Self {
        Self {
            users: users.clone(),
            metrics: metrics.clone(),
        }
    }

    #[instrument(skip(self, query))]
    pub fn report(&self, query: &Query) -> Response {
        let mut output = match query.get_param("get").unwrap_or_default() {
            b"stats" => stats(&self.metrics.snapshot()),
            b"prom_stats" => prom_stats(&self.metrics.snapshot()),
            b"user" => self.user(query),
            _ => "Invalid action\n".to_string(),
        };

        output.push_str(SUCCESS);

        Response::plain(output)
    }

    fn user(&self, query: &Query) -> String {
        let Some(passkey) = query.get_param_str("key").filter(|key| !key.is_empty()) else {
            return "Invalid action\n".to_string();
        };

        match self.users.get(&passkey) {
            Some(user) => format!("{} leeching\n{} seeding\n", user.leeching(), user.seeding()),
            None => "Passkey not found\n".to_string(),
        }
    }
}

fn stats(snapshot: &MetricsSnapshot) -> String {
    let mut output = format!("Uptime: {}\n", format_uptime(snapshot.uptime.as_secs()));

    let lines: [(String, &str); 12] = [
        (snapshot.opened_connections.to_string(), "connections opened"),
        (snapshot.open_connections.to_string(), "open connections"),
        (snapshot.connection_rate.to_string(), "connections/s"),
        (snapshot.requests.to_string(), "requests handled"),
        (snapshot.request_rate.to_string(), "requests/s"),
        (snapshot.succ_announcements.to_string(), "successful announcements"),
        (snapshot.failed_announcements().to_string(), "failed announcements"),
        (snapshot.scrapes.to_string(), "scrapes"),
        (snapshot.leechers.to_string(), "leechers tracked"),
        (snapshot.seeders.to_string(), "seeders tracked"),
        (snapshot.bytes_read.to_string(), "bytes read"),
        (snapshot.bytes_written.to_string(), "bytes written"),
    ];

    for (value, name) in lines {
        let _ = writeln!(output, "{value} {name}");
    }

    output
}

fn prom_stats(snapshot: &MetricsSnapshot) -> String {
    let metrics: [(&str, String); 12] = [
        ("uptime", snapshot.uptime.as_secs().to_string()),
        ("open_connections", snapshot.open_connections.to_string()),
        ("connection_rate", snapshot.connection_rate.to_string()),
        ("requests", snapshot.requests.to_string()),
        ("request_rate", snapshot.request_rate.to_string()),
        ("succ_announcements", snapshot.succ_announcements.to_string()),
        ("total_announcements", snapshot.announcements.to_string()),
        ("scrapes", snapshot.scrapes.to_string()),
        ("leechers", snapshot.leechers.to_string()),
        ("seeders", snapshot.seeders.to_string()),
        ("bytes_read", snapshot.bytes_read.to_string()),
        ("bytes_written", snapshot.bytes_written.to_string()),
    ];

    let mut output = String::new();

    for (name, value) in metrics {
        let _ = writeln!(output, "{METRICS_PREFIX}_{name} {value}");
    }

    // Ends the exposition, the trailing `success` becomes a comment.
    output.push('#');

    output
}
