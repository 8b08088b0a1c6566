//! `Announce` request params.
//!
//! Extraction never fails: missing or malformed values fall back to their
//! defaults and the announce handler decides what is acceptable. For example
//! the `peer_id` is kept even if it doesn't decode to 20 bytes.
use aquatic_udp_protocol::AnnounceEvent;

use crate::percent_encoding::hex_decode;
use crate::v1::query::{parse_integer, Query};

#[derive(Debug, Clone, PartialEq)]
pub struct Announce {
    /// Decoded `info_hash`. Empty when the param is missing.
    pub info_hash: Vec<u8>,
    /// Decoded `peer_id`.
    pub peer_id: Option<Vec<u8>>,
    pub port: u16,
    pub uploaded: i64,
    pub downloaded: i64,
    pub left: i64,
    pub corrupt: i64,
    pub event: AnnounceEvent,
    /// Only compact announces are supported.
    pub compact: bool,
    pub numwant: Option<i64>,
    /// Raw `ip` param. It might be an IPv4 or an IPv6 literal.
    pub ip: Option<Vec<u8>>,
    /// Raw `ipv4` param.
    pub ipv4: Option<Vec<u8>>,
    /// Raw `ipv6` param.
    pub ipv6: Option<Vec<u8>>,
}

impl From<&Query> for Announce {
    fn from(query: &Query) -> Self {
        let integer = |name: &str| query.get_param(name).map_or(0, parse_integer);

        Self {
            info_hash: query.get_param("info_hash").map(hex_decode).unwrap_or_default(),
            peer_id: query.get_param("peer_id").map(hex_decode),
            port: port(integer("port")),
            uploaded: integer("uploaded"),
            downloaded: integer("downloaded"),
            left: integer("left"),
            corrupt: integer("corrupt"),
            event: query.get_param("event").map_or(AnnounceEvent::None, event),
            compact: query.get_param("compact") == Some(b"1".as_slice()),
            numwant: query.get_param_integer("numwant"),
            ip: query.get_param("ip").map(<[u8]>::to_vec),
            ipv4: query.get_param("ipv4").map(<[u8]>::to_vec),
            ipv6: query.get_param("ipv6").map(<[u8]>::to_vec),
        }
    }
}

/// The port wraps like a 16 bits unsigned integer.
fn port(value: i64) -> u16 {
    u16::try_from(value & 0xFFFF).unwrap_or_default()
}

fn event(value: &[u8]) -> AnnounceEvent {
    match value {
        b"started" => AnnounceEvent::Started,
        b"stopped" => AnnounceEvent::Stopped,
        b"completed" => AnnounceEvent::Completed,
        _ => AnnounceEvent::None,
    }
}
