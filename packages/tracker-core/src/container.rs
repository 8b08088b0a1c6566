//! Wiring of the tracker services.
//!
//! Every service is built once and shared behind an [`Arc`]. The transport
//! only needs the [`RequestHandler`]; the jobs use the buffers, the reaper and
//! the loader.
use std::sync::Arc;

use swarm_tracker_configuration::Core;

use crate::announce_handler::AnnounceHandler;
use crate::databases::pipeline::WriteBuffers;
use crate::databases::setup::initialize_database;
use crate::databases::Database;
use crate::deletion_reasons::DeletionReasons;
use crate::loader::Loader;
use crate::reaper::Reaper;
use crate::report_handler::ReportHandler;
use crate::request_handler::RequestHandler;
use crate::scrape_handler::ScrapeHandler;
use crate::statistics::Metrics;
use crate::status::TrackerStatus;
use crate::token_expiry::TokenExpiry;
use crate::torrent::manager::TorrentsManager;
use crate::torrent::repository::in_memory::InMemoryTorrentRepository;
use crate::update_handler::UpdateHandler;
use crate::users::Users;
use crate::whitelist::authorization::WhitelistAuthorization;
use crate::whitelist::manager::WhitelistManager;
use crate::whitelist::repository::in_memory::InMemoryWhitelist;

pub struct TrackerCoreContainer {
    pub core_config: Arc<Core>,
    pub database: Arc<Box<dyn Database>>,
    pub status: Arc<TrackerStatus>,
    pub metrics: Arc<Metrics>,
    pub users: Arc<Users>,
    pub in_memory_torrent_repository: Arc<InMemoryTorrentRepository>,
    pub in_memory_whitelist: Arc<InMemoryWhitelist>,
    pub whitelist_authorization: Arc<WhitelistAuthorization>,
    pub whitelist_manager: Arc<WhitelistManager>,
    pub deletion_reasons: Arc<DeletionReasons>,
    pub write_buffers: Arc<WriteBuffers>,
    pub token_expiry: Arc<dyn TokenExpiry>,
    pub torrents_manager: Arc<TorrentsManager>,
    pub announce_handler: Arc<AnnounceHandler>,
    pub scrape_handler: Arc<ScrapeHandler>,
    pub update_handler: Arc<UpdateHandler>,
    pub report_handler: Arc<ReportHandler>,
    pub request_handler: Arc<RequestHandler>,
    pub reaper: Arc<Reaper>,
    pub loader: Arc<Loader>,
}

impl TrackerCoreContainer {
    /// It connects to the database and builds the services with empty lists.
    /// The lists are filled by the [`Loader`].
    ///
    /// # Panics
    ///
    /// Will panic if the database can't be initialized.
    #[must_use]
    pub fn initialize(core_config: &Arc<Core>, token_expiry: Arc<dyn TokenExpiry>) -> Self {
        let database = initialize_database(core_config);
        let status = Arc::new(TrackerStatus::default());
        let metrics = Arc::new(Metrics::default());
        let users = Arc::new(Users::default());
        let in_memory_torrent_repository = Arc::new(InMemoryTorrentRepository::default());
        let in_memory_whitelist = Arc::new(InMemoryWhitelist::default());
        let whitelist_authorization = Arc::new(WhitelistAuthorization::new(&in_memory_whitelist));
        let whitelist_manager = Arc::new(WhitelistManager::new(in_memory_whitelist.clone()));
        let deletion_reasons = Arc::new(DeletionReasons::default());
        let write_buffers = Arc::new(WriteBuffers::new(core_config, &database));

        let torrents_manager = Arc::new(TorrentsManager::new(
            core_config,
            &in_memory_torrent_repository,
            &deletion_reasons,
            &write_buffers,
            &metrics,
        ));

        let announce_handler = Arc::new(AnnounceHandler::new(
            core_config,
            &in_memory_torrent_repository,
            &deletion_reasons,
            &whitelist_authorization,
            &write_buffers,
            &token_expiry,
            &metrics,
        ));

        let scrape_handler = Arc::new(ScrapeHandler::new(&in_memory_torrent_repository));

        let update_handler = Arc::new(UpdateHandler::new(
            &users,
            &in_memory_torrent_repository,
            &torrents_manager,
            &whitelist_manager,
            &announce_handler,
        ));

        let report_handler = Arc::new(ReportHandler::new(&users, &metrics));

        let request_handler = Arc::new(RequestHandler::new(
            core_config,
            &status,
            &users,
            &announce_handler,
            &scrape_handler,
            &update_handler,
            &report_handler,
            &metrics,
        ));

        let reaper = Arc::new(Reaper::new(&torrents_manager));

        let loader = Arc::new(Loader::new(
            core_config,
            &database,
            &status,
            &users,
            &torrents_manager,
            &whitelist_manager,
        ));

        Self {
            core_config: core_config.clone(),
            database,
            status,
            metrics,
            users,
            in_memory_torrent_repository,
            in_memory_whitelist,
            whitelist_authorization,
            whitelist_manager,
            deletion_reasons,
            write_buffers,
            token_expiry,
            torrents_manager,
            announce_handler,
            scrape_handler,
            update_handler,
            report_handler,
            request_handler,
            reaper,
            loader,
        }
    }
}
