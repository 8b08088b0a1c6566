//! Bulk loading of the tracker lists.
//!
//! The torrents, the free-leech tokens, the users and the client whitelist are
//! read from the site database at startup and again whenever a reload is
//! requested. The tracker is paused while the lists are replaced, so that no
//! announce sees a half loaded state.
use std::sync::Arc;

use swarm_tracker_configuration::Core;
use tracing::{info, instrument, warn};

use crate::databases::{self, Database};
use crate::status::{Status, TrackerStatus};
use crate::torrent::manager::TorrentsManager;
use crate::users::Users;
use crate::whitelist::manager::WhitelistManager;

pub struct Loader {
    readonly: bool,
    database: Arc<Box<dyn Database>>,
    status: Arc<TrackerStatus>,
    users: Arc<Users>,
    torrents_manager: Arc<TorrentsManager>,
    whitelist_manager: Arc<WhitelistManager>,
}

impl Loader {
    #[must_use]
    pub fn new(
        config: &Core,
        database: &Arc<Box<dyn Database>>,
        status: &Arc<TrackerStatus>,
        users: &Arc<Users>,
        torrents_manager: &Arc<TorrentsManager>,
        whitelist_manager: &Arc<WhitelistManager>,
    ) -> Self {
        Self {
            readonly: config.database.readonly,
            database: database.clone(),
            status: status.clone(),
            users: users.clone(),
            torrents_manager: torrents_manager.clone(),
            whitelist_manager: whitelist_manager.clone(),
        }
    }

    /// Reloads every list from the database.
    ///
    /// The tracker is reopened even if a list could not be loaded. The lists
    /// loaded before the failure keep their new content.
    ///
    /// # Errors
    ///
    /// Will return a `database::Error` if any of the lists can't be loaded.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), databases::error::Error> {
        self.status.set(Status::Paused);

        let loaded = self.load_lists().await;

        self.status.set(Status::Open);

        loaded
    }

    async fn load_lists(&self) -> Result<(), databases::error::Error> {
        self.torrents_manager.load_torrents_from_database(&self.database)?;

        let users = self.users.load(self.database.load_users()?);

        info!(
            "loaded {} users ({} new, {} removed)",
            self.users.len(),
            users.added,
            users.removed
        );

        let clients = self.whitelist_manager.load_whitelist_from_database(&self.database).await?;

        info!("loaded {clients} clients into the whitelist");

        Ok(())
    }

    /// Wipes the peer rows left in the database by a previous run.
    ///
    /// # Errors
    ///
    /// Will return a `database::Error` if the rows can't be deleted.
    pub fn clear_peer_data(&self) -> Result<(), databases::error::Error> {
        if self.readonly {
            warn!("read-only database, the peer data of the previous run is kept");
            return Ok(());
        }

        self.database.clear_peer_data()?;

        info!("cleared the peer data of the previous run");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use swarm_tracker_configuration::Core;
    use swarm_tracker_located_error::DynError;
    use swarm_tracker_primitives::FreeLeech;

    use super::Loader;
    use crate::databases::driver::Driver;
    use crate::databases::error::Error;
    use crate::databases::pipeline::WriteBuffers;
    use crate::databases::records::{TorrentRow, UserRow};
    use crate::databases::{Database, MockDatabase};
    use crate::deletion_reasons::DeletionReasons;
    use crate::statistics::Metrics;
    use crate::status::{Status, TrackerStatus};
    use crate::test_helpers::tests::{ephemeral_configuration, sample_info_hash};
    use crate::torrent::manager::TorrentsManager;
    use crate::torrent::repository::in_memory::InMemoryTorrentRepository;
    use crate::users::Users;
    use crate::whitelist::manager::WhitelistManager;
    use crate::whitelist::repository::in_memory::InMemoryWhitelist;

    const PASSKEY: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    struct LoaderDeps {
        status: Arc<TrackerStatus>,
        users: Arc<Users>,
        in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,
        in_memory_whitelist: Arc<InMemoryWhitelist>,
    }

    /// The write buffers ask the store for its dialect when they are built.
    fn initialize_loader_with(config: &Core, mut database: MockDatabase) -> (Loader, LoaderDeps) {
        database.expect_driver().return_const(Driver::Sqlite3);
        let database: Arc<Box<dyn Database>> = Arc::new(Box::new(database));
        let status = Arc::new(TrackerStatus::default());
        let users = Arc::new(Users::default());
        let in_memory_torrent_repository = Arc::new(InMemoryTorrentRepository::default());
        let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
        let write_buffers = Arc::new(WriteBuffers::new(config, &database));
        let torrents_manager = Arc::new(TorrentsManager::new(
            config,
            &in_memory_torrent_repository,
            &Arc::new(DeletionReasons::default()),
            &write_buffers,
            &Arc::new(Metrics::default()),
        ));
        let whitelist_manager = Arc::new(WhitelistManager::new(in_memory_whitelist.clone()));

        let loader = Loader::new(config, &database, &status, &users, &torrents_manager, &whitelist_manager);

        (
            loader,
            LoaderDeps {
                status,
                users,
                in_memory_torrent_repository,
                in_memory_whitelist,
            },
        )
    }

    fn database_with_lists() -> MockDatabase {
        let mut database = MockDatabase::default();
        database.expect_load_torrents().returning(|| {
            Ok(vec![TorrentRow {
                id: 1,
                info_hash: sample_info_hash(),
                free_leech: FreeLeech::Normal,
                completed: 3,
            }])
        });
        database.expect_load_tokens().returning(|| Ok(vec![]));
        database.expect_load_users().returning(|| {
            Ok(vec![UserRow {
                id: 7,
                passkey: PASSKEY.to_string(),
                can_leech: true,
                protect_ip: false,
            }])
        });
        database
            .expect_load_whitelist()
            .returning(|| Ok(vec!["-qB".to_string(), "-TR".to_string()]));
        database
    }

    #[tokio::test]
    async fn it_should_load_every_list_and_reopen_the_tracker() {
        let (loader, deps) = initialize_loader_with(&ephemeral_configuration(), database_with_lists());
        deps.status.set(Status::Paused);

        loader.load().await.unwrap();

        assert!(deps.in_memory_torrent_repository.contains(&sample_info_hash()));
        assert_eq!(deps.users.get(PASSKEY).unwrap().id(), 7);
        assert_eq!(deps.in_memory_whitelist.len().await, 2);
        assert_eq!(deps.status.get(), Status::Open);
    }

    #[tokio::test]
    async fn it_should_reopen_the_tracker_when_a_list_can_not_be_loaded() {
        let mut database = MockDatabase::default();
        database.expect_load_torrents().returning(|| {
            Err(Error::InvalidQuery {
                source: (Arc::new(std::io::Error::other("lost connection")) as DynError).into(),
                driver: Driver::Sqlite3,
            })
        });
        let (loader, deps) = initialize_loader_with(&ephemeral_configuration(), database);

        assert!(loader.load().await.is_err());
        assert_eq!(deps.status.get(), Status::Open);
    }

    #[tokio::test]
    async fn it_should_not_reopen_a_closing_tracker() {
        let (loader, deps) = initialize_loader_with(&ephemeral_configuration(), database_with_lists());
        deps.status.shutdown();

        loader.load().await.unwrap();

        assert_eq!(deps.status.get(), Status::Closing);
    }

    #[test]
    fn it_should_clear_the_peer_data_of_the_previous_run() {
        let mut database = MockDatabase::default();
        database.expect_clear_peer_data().times(1).returning(|| Ok(()));
        let (loader, _deps) = initialize_loader_with(&ephemeral_configuration(), database);

        assert!(loader.clear_peer_data().is_ok());
    }

    #[test]
    fn it_should_keep_the_peer_data_on_a_read_only_database() {
        let mut config = ephemeral_configuration();
        config.database.readonly = true;
        let mut database = MockDatabase::default();
        database.expect_clear_peer_data().never();
        let (loader, _deps) = initialize_loader_with(&config, database);

        assert!(loader.clear_peer_data().is_ok());
    }
}
