use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP tracker transport.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct HttpTracker {
    /// The address the tracker will bind to.
    /// The format is `ip:port`, for example `0.0.0.0:34000`. If you want to
    /// listen to all interfaces, use `0.0.0.0`. If you want the operating
    /// system to choose a random port, use port `0`.
    #[serde(default = "HttpTracker::default_bind_address")]
    pub bind_address: SocketAddr,

    /// Connections accepted at the same time. New connections wait beyond it.
    #[serde(default = "HttpTracker::default_max_connections")]
    pub max_connections: usize,

    /// Largest request the transport reads. Longer requests are truncated.
    #[serde(default = "HttpTracker::default_max_request_size")]
    pub max_request_size: usize,

    /// Seconds to wait for a complete request on a new connection.
    #[serde(default = "HttpTracker::default_connection_timeout")]
    pub connection_timeout: u64,

    /// Seconds an idle keep-alive connection stays open. `0` disables
    /// keep-alive.
    #[serde(default = "HttpTracker::default_keepalive_timeout")]
    pub keepalive_timeout: u64,
}

impl Default for HttpTracker {
    fn default() -> Self {
        Self {
            bind_address: Self::default_bind_address(),
            max_connections: Self::default_max_connections(),
            max_request_size: Self::default_max_request_size(),
            connection_timeout: Self::default_connection_timeout(),
            keepalive_timeout: Self::default_keepalive_timeout(),
        }
    }
}

impl HttpTracker {
    fn default_bind_address() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 34000)
    }

    fn default_max_connections() -> usize {
        1024
    }

    fn default_max_request_size() -> usize {
        4096
    }

    fn default_connection_timeout() -> u64 {
        10
    }

    fn default_keepalive_timeout() -> u64 {
        0
    }

    #[must_use]
    pub fn keepalive_enabled(&self) -> bool {
        self.keepalive_timeout > 0
    }
}
