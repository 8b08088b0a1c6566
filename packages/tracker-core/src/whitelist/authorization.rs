//! Whitelist authorization.
use std::sync::Arc;

use aquatic_udp_protocol::PeerId;
use tracing::instrument;

use super::repository::in_memory::InMemoryWhitelist;
use crate::error::RequestError;

/// Decides whether a client may announce, based on its peer id.
pub struct WhitelistAuthorization {
    /// The in-memory list of allowed clients.
    in_memory_whitelist: Arc<InMemoryWhitelist>,
}

impl WhitelistAuthorization {
    #[must_use]
    pub fn new(in_memory_whitelist: &Arc<InMemoryWhitelist>) -> Self {
        Self {
            in_memory_whitelist: in_memory_whitelist.clone(),
        }
    }

    /// Checks whether a client is authorized.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::NotWhitelisted` if the whitelist is not empty
    /// and no prefix matches the peer id.
    #[instrument(skip(self, peer_id), err)]
    pub async fn authorize(&self, peer_id: &PeerId) -> Result<(), RequestError> {
        if self.in_memory_whitelist.allows(&peer_id.0).await {
            return Ok(());
        }

        Err(RequestError::NotWhitelisted)
    }
}
