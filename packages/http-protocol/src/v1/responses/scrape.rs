//! `Scrape` response.
use std::collections::BTreeMap;

use bittorrent_primitives::info_hash::InfoHash;
use swarm_tracker_primitives::swarm_metadata::SwarmMetadata;

use super::Response;
use crate::bencode;

/// Statistics of the scraped torrents, keyed by the raw info-hash.
///
/// Files are rendered in info-hash byte order, as bencode requires for
/// dictionary keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scrape {
    files: BTreeMap<InfoHash, SwarmMetadata>,
}

impl Scrape {
    pub fn add_file(&mut self, info_hash: &InfoHash, swarm_metadata: SwarmMetadata) {
        self.files.insert(*info_hash, swarm_metadata);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `d5:filesd<20 bytes hash>d8:completei..e10:downloadedi..e10:incompletei..ee...ee`
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        let mut body = b"d".to_vec();
        body.extend(bencode::str(b"files"));
        body.push(b'd');

        for (info_hash, swarm_metadata) in &self.files {
            body.extend(bencode::str(&info_hash.bytes()));
            body.push(b'd');
            body.extend(bencode::str(b"complete"));
            body.extend(bencode::int(i64::from(swarm_metadata.complete)));
            body.extend(bencode::str(b"downloaded"));
            body.extend(bencode::int(i64::from(swarm_metadata.downloaded)));
            body.extend(bencode::str(b"incomplete"));
            body.extend(bencode::int(i64::from(swarm_metadata.incomplete)));
            body.push(b'e');
        }

        body.extend(b"ee");
        body
    }
}

impl From<Scrape> for Response {
    fn from(scrape: Scrape) -> Self {
        Response::plain(scrape.body())
    }
}
