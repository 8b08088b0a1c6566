//! Changes to the client whitelist.
use std::sync::Arc;

use tracing::info;

use super::repository::in_memory::InMemoryWhitelist;
use crate::databases::{self, Database};

/// It handles the list of allowed clients.
///
/// The site owns the list: it's loaded from the store and kept up to date
/// with the changes the site sends through the `update` action. Those changes
/// are not written back.
pub struct WhitelistManager {
    /// The in-memory list of allowed clients.
    in_memory_whitelist: Arc<InMemoryWhitelist>,
}

impl WhitelistManager {
    #[must_use]
    pub fn new(in_memory_whitelist: Arc<InMemoryWhitelist>) -> Self {
        Self { in_memory_whitelist }
    }

    pub async fn add_client(&self, prefix: &[u8]) {
        if self.in_memory_whitelist.add(prefix).await {
            info!("added client to the whitelist: {}", String::from_utf8_lossy(prefix));
        }
    }

    pub async fn remove_client(&self, prefix: &[u8]) {
        if self.in_memory_whitelist.remove(prefix).await {
            info!("removed client from the whitelist: {}", String::from_utf8_lossy(prefix));
        }
    }

    pub async fn edit_client(&self, old_prefix: &[u8], new_prefix: &[u8]) {
        self.in_memory_whitelist.replace(old_prefix, new_prefix).await;

        info!(
            "edited client in the whitelist: {} -> {}",
            String::from_utf8_lossy(old_prefix),
            String::from_utf8_lossy(new_prefix)
        );
    }

    /// It replaces the whitelist with the one in the database.
    ///
    /// # Errors
    ///
    /// Will return a `database::Error` if unable to load the whitelist from
    /// the database. The in-memory list is kept in that case.
    pub async fn load_whitelist_from_database(&self, database: &Arc<Box<dyn Database>>) -> Result<usize, databases::error::Error> {
        let prefixes: Vec<Vec<u8>> = database
            .load_whitelist()?
            .into_iter()
            .map(String::into_bytes)
            .collect();

        let loaded = prefixes.len();

        self.in_memory_whitelist.reset(prefixes).await;

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {

    use std::sync::Arc;

    use crate::databases::{Database, MockDatabase};
    use crate::whitelist::manager::WhitelistManager;
    use crate::whitelist::repository::in_memory::InMemoryWhitelist;

    #[tokio::test]
    async fn it_should_replace_the_whitelist_with_the_one_in_the_database() {
        let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
        in_memory_whitelist.add(b"-UT").await;
        let whitelist_manager = WhitelistManager::new(in_memory_whitelist.clone());

        let mut database = MockDatabase::default();
        database
            .expect_load_whitelist()
            .returning(|| Ok(vec!["-qB".to_string(), "-TR".to_string()]));
        let database: Arc<Box<dyn Database>> = Arc::new(Box::new(database));

        let loaded = whitelist_manager.load_whitelist_from_database(&database).await.unwrap();

        assert_eq!(loaded, 2);
        assert!(!in_memory_whitelist.allows(b"-UT3550-abcdefghijkl").await);
        assert!(in_memory_whitelist.allows(b"-TR3000-abcdefghijkl").await);
    }

    #[tokio::test]
    async fn it_should_keep_the_whitelist_when_the_database_fails() {
        let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
        in_memory_whitelist.add(b"-UT").await;
        let whitelist_manager = WhitelistManager::new(in_memory_whitelist.clone());

        let mut database = MockDatabase::default();
        database
            .expect_load_whitelist()
            .returning(|| Err(r2d2_sqlite::rusqlite::Error::InvalidQuery.into()));
        let database: Arc<Box<dyn Database>> = Arc::new(Box::new(database));

        assert!(whitelist_manager.load_whitelist_from_database(&database).await.is_err());
        assert_eq!(in_memory_whitelist.len().await, 1);
    }
}
