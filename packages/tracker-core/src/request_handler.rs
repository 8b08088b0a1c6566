//! Request handler.
//!
//! Entry point of the tracker for a raw request read by the transport. It
//! parses the request, checks the tracker status and the credentials, and
//! dispatches it to the handler of its action:
//!
//! | Action     | Credentials         | Handler                                           |
//! |------------|---------------------|---------------------------------------------------|
//! | `announce` | user passkey        | [`AnnounceHandler`](crate::announce_handler::AnnounceHandler) |
//! | `scrape`   | user passkey        | [`ScrapeHandler`](crate::scrape_handler::ScrapeHandler)       |
//! | `update`   | site password       | [`UpdateHandler`](crate::update_handler::UpdateHandler)       |
//! | `report`   | report password     | [`ReportHandler`](crate::report_handler::ReportHandler)       |
//!
//! Every failure becomes a bencoded `failure reason` response.
use std::net::IpAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bittorrent_http_protocol::v1::request::{parse, Action, ParsedRequest, Request};
use bittorrent_http_protocol::v1::requests::announce::Announce;
use bittorrent_http_protocol::v1::requests::scrape::Scrape;
use bittorrent_http_protocol::v1::responses::{self, Response};
use swarm_tracker_configuration::Core;
use tracing::{debug, instrument};

use crate::announce_handler::{AnnounceData, AnnounceHandler, ClientInfo};
use crate::error::RequestError;
use crate::report_handler::ReportHandler;
use crate::scrape_handler::ScrapeHandler;
use crate::statistics::Metrics;
use crate::status::TrackerStatus;
use crate::update_handler::UpdateHandler;
use crate::users::Users;

pub struct RequestHandler {
    config: Core,
    status: Arc<TrackerStatus>,
    users: Arc<Users>,
    announce_handler: Arc<AnnounceHandler>,
    scrape_handler: Arc<ScrapeHandler>,
    update_handler: Arc<UpdateHandler>,
    report_handler: Arc<ReportHandler>,
    metrics: Arc<Metrics>,
}

impl RequestHandler {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        config: &Core,
        status: &Arc<TrackerStatus>,
        users: &Arc<Users>,
        announce_handler: &Arc<AnnounceHandler>,
        scrape_handler: &Arc<ScrapeHandler>,
        update_handler: &Arc<UpdateHandler>,
        report_handler: &Arc<ReportHandler>,
        metrics: &Arc<Metrics>,
    ) -> Self {
        Self {
            config: config.clone(),
            status: status.clone(),
            users: users.clone(),
            announce_handler: announce_handler.clone(),
            scrape_handler: scrape_handler.clone(),
            update_handler: update_handler.clone(),
            report_handler: report_handler.clone(),
            metrics: metrics.clone(),
        }
    }

    /// Handles one raw request from `remote_ip`.
    ///
    /// The response keeps the connection open only when keep-alive is
    /// enabled and the client asked for it.
    #[instrument(skip(self, raw_request))]
    pub async fn handle(&self, raw_request: &[u8], remote_ip: IpAddr, keepalive_enabled: bool) -> Response {
        self.metrics.requests.fetch_add(1, Ordering::Relaxed);

        let request = match parse(raw_request) {
            Ok(ParsedRequest::Tracker(request)) => request,
            Ok(ParsedRequest::Banner) => return Response::banner(),
            Err(err) => return failure(err.into()),
        };

        let keep_alive = request.keep_alive(keepalive_enabled);

        let response = match self.dispatch(&request, remote_ip).await {
            Ok(response) => response,
            Err(err) => failure(err),
        };

        response.with_keep_alive(keep_alive)
    }

    async fn dispatch(&self, request: &Request, remote_ip: IpAddr) -> Result<Response, RequestError> {
        match request.action {
            Action::Announce => self.metrics.announcements.fetch_add(1, Ordering::Relaxed),
            Action::Scrape => self.metrics.scrapes.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        if !self.status.is_open() {
            return Err(RequestError::TrackerUnavailable);
        }

        match request.action {
            Action::Invalid => Err(RequestError::InvalidAction),
            Action::Update => {
                authenticate(&request.passkey, &self.config.secrets.site_password)?;

                Ok(self.update_handler.update(&request.query).await)
            }
            Action::Report => {
                authenticate(&request.passkey, &self.config.secrets.report_password)?;

                Ok(self.report_handler.report(&request.query))
            }
            Action::Announce => {
                let user = self.users.get(&request.passkey).ok_or(RequestError::PasskeyNotFound)?;

                let announce = Announce::from(&request.query);
                let client = ClientInfo {
                    remote_ip,
                    x_forwarded_for: request.header("x-forwarded-for"),
                    user_agent: request.header("user-agent").unwrap_or_default(),
                };

                let announce_data = self.announce_handler.announce(&user, &announce, &client).await?;

                Ok(responses::announce::Announce::from(announce_data).into())
            }
            Action::Scrape => {
                self.users.get(&request.passkey).ok_or(RequestError::PasskeyNotFound)?;

                let scrape = Scrape::from(&request.query);

                Ok(self.scrape_handler.scrape(&scrape.info_hashes).into())
            }
        }
    }
}

fn authenticate(passkey: &str, password: &str) -> Result<(), RequestError> {
    if password.is_empty() || passkey != password {
        return Err(RequestError::AuthenticationFailure);
    }

    Ok(())
}

fn failure(err: RequestError) -> Response {
    debug!("request failed: {err}");

    responses::error::Error::from(err).into()
}

impl From<AnnounceData> for responses::announce::Announce {
    fn from(announce_data: AnnounceData) -> Self {
        Self {
            complete: announce_data.stats.complete,
            downloaded: announce_data.stats.downloaded,
            incomplete: announce_data.stats.incomplete,
            interval: announce_data.interval,
            min_interval: announce_data.min_interval,
            peers: announce_data.peers.ipv4,
            peers6: announce_data.peers.ipv6,
        }
    }
}
