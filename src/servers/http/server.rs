//! The TCP server of the HTTP tracker.
use std::net::SocketAddr;
use std::sync::Arc;

use bittorrent_tracker_core::container::TrackerCoreContainer;
use swarm_tracker_configuration::HttpTracker;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::connection::{self, ConnectionSettings};

/// Error that can occur when starting or stopping the HTTP server.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unable to bind the http tracker to {bind_address}: {source}")]
    Bind {
        bind_address: SocketAddr,
        source: std::io::Error,
    },

    #[error("the http tracker already stopped")]
    AlreadyStopped,

    #[error("the http tracker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A server that is not listening yet.
pub struct HttpServer {
    config: HttpTracker,
    container: Arc<TrackerCoreContainer>,
}

/// A listening server.
pub struct RunningHttpServer {
    pub local_addr: SocketAddr,
    halt: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl HttpServer {
    #[must_use]
    pub fn new(config: &HttpTracker, container: &Arc<TrackerCoreContainer>) -> Self {
        Self {
            config: config.clone(),
            container: container.clone(),
        }
    }

    /// It binds the socket and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Will return an error if the socket can't be bound.
    pub async fn start(self) -> Result<RunningHttpServer, Error> {
        let bind_address = self.config.bind_address;

        let listener = TcpListener::bind(bind_address)
            .await
            .map_err(|source| Error::Bind { bind_address, source })?;

        let local_addr = listener.local_addr().map_err(|source| Error::Bind { bind_address, source })?;

        let (halt, rx_halt) = oneshot::channel();

        let task = tokio::spawn(accept_connections(listener, self.config, self.container, rx_halt));

        info!("http tracker listening on http://{local_addr}");

        Ok(RunningHttpServer { local_addr, halt, task })
    }
}

impl RunningHttpServer {
    /// Stops accepting connections. Connections being served are not
    /// interrupted.
    ///
    /// # Errors
    ///
    /// Will return an error if the accept loop already ended.
    pub async fn stop(self) -> Result<(), Error> {
        self.halt.send(()).map_err(|()| Error::AlreadyStopped)?;

        self.task.await?;

        info!("http tracker stopped");

        Ok(())
    }
}

async fn accept_connections(
    listener: TcpListener,
    config: HttpTracker,
    container: Arc<TrackerCoreContainer>,
    mut rx_halt: oneshot::Receiver<()>,
) {
    let settings = ConnectionSettings::from(&config);
    let slots = Arc::new(Semaphore::new(config.max_connections));

    loop {
        // Beyond the limit new connections wait in the backlog.
        let permit = tokio::select! {
            _ = &mut rx_halt => break,
            permit = slots.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let (stream, remote_addr) = tokio::select! {
            _ = &mut rx_halt => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    error!("failed to accept a connection: {err}");
                    continue;
                }
            },
        };

        debug!(%remote_addr, "connection accepted");

        let request_handler = container.request_handler.clone();
        let metrics = container.metrics.clone();

        tokio::spawn(async move {
            connection::serve(stream, remote_addr, settings, request_handler, metrics).await;
            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use swarm_tracker_test_helpers::configuration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::{Error, HttpServer};
    use crate::servers::http::test_helpers::initialize_container;

    #[tokio::test]
    async fn it_should_serve_the_banner_to_a_browser() {
        let config = configuration::ephemeral().http_tracker;
        let server = HttpServer::new(&config, &initialize_container()).start().await.unwrap();

        let mut stream = TcpStream::connect(server.local_addr).await.unwrap();
        stream
            .write_all(b"GET /aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa/announce HTTP/1.1\r\nHost: tracker\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.contains("Tracker is running"));

        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn it_should_stop_accepting_connections_once_stopped() {
        let config = configuration::ephemeral().http_tracker;
        let server = HttpServer::new(&config, &initialize_container()).start().await.unwrap();
        let local_addr = server.local_addr;

        server.stop().await.unwrap();

        assert!(TcpStream::connect(local_addr).await.is_err());
    }

    #[tokio::test]
    async fn it_should_fail_to_start_on_an_address_in_use() {
        let container = initialize_container();
        let running = HttpServer::new(&configuration::ephemeral().http_tracker, &container)
            .start()
            .await
            .unwrap();

        let mut config = configuration::ephemeral().http_tracker;
        config.bind_address = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), running.local_addr.port());

        assert!(matches!(
            HttpServer::new(&config, &container).start().await,
            Err(Error::Bind { .. })
        ));

        running.stop().await.unwrap();
    }
}
