//! `Announce` response.
use super::Response;
use crate::bencode;

/// Swarm statistics and the compact peer lists sent back to a client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Announce {
    /// Seeders.
    pub complete: u32,
    /// Snatches.
    pub downloaded: u32,
    /// Leechers.
    pub incomplete: u32,
    pub interval: u32,
    pub min_interval: u32,
    /// Concatenated 6 bytes IPv4 endpoints.
    pub peers: Vec<u8>,
    /// Concatenated 18 bytes IPv6 endpoints. The key is omitted when empty.
    pub peers6: Vec<u8>,
}

impl Announce {
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        let mut body = b"d".to_vec();
        body.extend(bencode::str(b"complete"));
        body.extend(bencode::int(i64::from(self.complete)));
        body.extend(bencode::str(b"downloaded"));
        body.extend(bencode::int(i64::from(self.downloaded)));
        body.extend(bencode::str(b"incomplete"));
        body.extend(bencode::int(i64::from(self.incomplete)));
        body.extend(bencode::str(b"interval"));
        body.extend(bencode::int(i64::from(self.interval)));
        body.extend(bencode::str(b"min interval"));
        body.extend(bencode::int(i64::from(self.min_interval)));
        body.extend(bencode::str(b"peers"));
        body.extend(bencode::str(&self.peers));
        if !self.peers6.is_empty() {
            body.extend(bencode::str(b"peers6"));
            body.extend(bencode::str(&self.peers6));
        }
        body.push(b'e');
        body
    }
}

impl From<Announce> for Response {
    fn from(announce: Announce) -> Self {
        Response::plain(announce.body())
    }
}

#[cfg(test)]
mod tests {
    use super::Announce;

    #[test]
    fn it_should_render_an_announce_without_peers() {
        let announce = Announce {
            complete: 1,
            downloaded: 2,
            incomplete: 3,
            interval: 1801,
            min_interval: 1800,
            ..Default::default()
        };

        assert_eq!(
            String::from_utf8(announce.body()).unwrap(),
            "d8:completei1e10:downloadedi2e10:incompletei3e8:intervali1801e12:min intervali1800e5:peers0:e"
        );
    }

    #[test]
    fn it_should_render_the_compact_peer_lists() {
        let announce = Announce {
            peers: vec![126, 0, 0, 1, 0x1a, 0xe1],
            peers6: vec![0; 18],
            ..Default::default()
        };

        let body = announce.body();

        let mut expected_peers = b"5:peers6:".to_vec();
        expected_peers.extend_from_slice(&[126, 0, 0, 1, 0x1a, 0xe1]);
        let mut expected_peers6 = b"6:peers618:".to_vec();
        expected_peers6.extend_from_slice(&[0; 18]);

        assert!(body.windows(expected_peers.len()).any(|window| window == expected_peers));
        assert!(body.windows(expected_peers6.len()).any(|window| window == expected_peers6));
        assert!(body.ends_with(b"e"));
    }
}
