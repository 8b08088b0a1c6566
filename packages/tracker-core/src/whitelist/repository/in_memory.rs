//! The in-memory list of allowed clients.

/// In-memory list of peer id prefixes.
#[derive(Debug, Default)]
pub struct InMemoryWhitelist {
    prefixes: tokio::sync::RwLock<Vec<Vec<u8>>>,
}

impl InMemoryWhitelist {
    /// Adds a prefix.
    ///
    /// # Returns
    ///
    /// - `true` if the prefix was newly added.
    /// - `false` if the prefix was already in the whitelist.
    pub async fn add(&self, prefix: &[u8]) -> bool {
        let mut prefixes = self.prefixes.write().await;

        if prefixes.iter().any(|existing| existing == prefix) {
            return false;
        }

        prefixes.push(prefix.to_vec());
        true
    }

    /// Removes a prefix. It returns `true` if it was present.
    pub(crate) async fn remove(&self, prefix: &[u8]) -> bool {
        let mut prefixes = self.prefixes.write().await;
        let before = prefixes.len();
        prefixes.retain(|existing| existing != prefix);
        prefixes.len() != before
    }

    /// Replaces a prefix in place. The new prefix is added when the old one
    /// is not found.
    pub(crate) async fn replace(&self, old_prefix: &[u8], new_prefix: &[u8]) {
        let mut prefixes = self.prefixes.write().await;

        match prefixes.iter_mut().find(|existing| existing.as_slice() == old_prefix) {
            Some(existing) => *existing = new_prefix.to_vec(),
            None => prefixes.push(new_prefix.to_vec()),
        }
    }

    /// Replaces the whole list.
    pub(crate) async fn reset(&self, new_prefixes: Vec<Vec<u8>>) {
        *self.prefixes.write().await = new_prefixes;
    }

    /// Whether the peer id starts with one of the prefixes. An empty list
    /// allows every peer id.
    pub async fn allows(&self, peer_id: &[u8]) -> bool {
        let prefixes = self.prefixes.read().await;

        prefixes.is_empty() || prefixes.iter().any(|prefix| peer_id.starts_with(prefix))
    }

    pub async fn len(&self) -> usize {
        self.prefixes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.prefixes.read().await.is_empty()
    }
}
