//! `Scrape` request params.
use bittorrent_primitives::info_hash::InfoHash;

use crate::percent_encoding::hex_decode;
use crate::v1::query::Query;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scrape {
    pub info_hashes: Vec<InfoHash>,
}

impl From<&Query> for Scrape {
    /// Every `info_hash` value that doesn't decode to 20 bytes is ignored.
    fn from(query: &Query) -> Self {
        let info_hashes = query
            .get_param_vec("info_hash")
            .into_iter()
            .map(hex_decode)
            .filter(|bytes| bytes.len() == 20)
            .map(|bytes| InfoHash::from_bytes(&bytes))
            .collect();

        Self { info_hashes }
    }
}
