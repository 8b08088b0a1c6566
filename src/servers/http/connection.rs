//! A single client connection.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bittorrent_tracker_core::request_handler::RequestHandler;
use bittorrent_tracker_core::statistics::Metrics;
use swarm_tracker_configuration::HttpTracker;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time;
use tracing::{debug, instrument};

/// End of the request head.
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Transport limits of a connection.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub max_request_size: usize,
    pub connection_timeout: Duration,
    pub keepalive_timeout: Duration,
}

impl ConnectionSettings {
    #[must_use]
    pub fn keepalive_enabled(&self) -> bool {
        !self.keepalive_timeout.is_zero()
    }
}

impl From<&HttpTracker> for ConnectionSettings {
    fn from(config: &HttpTracker) -> Self {
        Self {
            max_request_size: config.max_request_size,
            connection_timeout: Duration::from_secs(config.connection_timeout),
            keepalive_timeout: Duration::from_secs(config.keepalive_timeout),
        }
    }
}

/// Serves the requests of a connection until the client or the tracker
/// closes it.
#[instrument(skip(stream, settings, request_handler, metrics))]
pub async fn serve<S>(
    mut stream: S,
    remote_addr: SocketAddr,
    settings: ConnectionSettings,
    request_handler: Arc<RequestHandler>,
    metrics: Arc<Metrics>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    metrics.connection_opened();

    let remote_ip = remote_addr.ip().to_canonical();
    let mut timeout = settings.connection_timeout;

    loop {
        let raw_request = match time::timeout(timeout, read_request(&mut stream, settings.max_request_size)).await {
            Ok(Ok(Some(raw_request))) => raw_request,
            Ok(Ok(None)) => break,
            Ok(Err(err)) => {
                debug!("failed to read the request: {err}");
                break;
            }
            Err(_) => {
                debug!("connection timed out");
                break;
            }
        };

        metrics.add_bytes_read(raw_request.len());

        let response = request_handler
            .handle(&raw_request, remote_ip, settings.keepalive_enabled())
            .await;

        let bytes = response.to_bytes();

        if let Err(err) = stream.write_all(&bytes).await {
            debug!("failed to write the response: {err}");
            break;
        }

        metrics.add_bytes_written(bytes.len());

        if !response.keep_alive {
            break;
        }

        timeout = settings.keepalive_timeout;
    }

    let _ = stream.shutdown().await;

    metrics.connection_closed();
}

/// Reads until the end of the request head. The request is cut at
/// `max_request_size` bytes.
///
/// It returns `None` when the client closed the connection before sending
/// anything.
///
/// # Errors
///
/// Will return an error if the stream can't be read.
pub async fn read_request<S>(stream: &mut S, max_request_size: usize) -> std::io::Result<Option<Vec<u8>>>
where
    S: AsyncRead + Unpin,
{
    let mut raw_request = Vec::with_capacity(max_request_size.min(1024));
    let mut chunk = [0u8; 1024];

    while raw_request.len() < max_request_size {
        let limit = chunk.len().min(max_request_size - raw_request.len());
        let read = stream.read(&mut chunk[..limit]).await?;

        if read == 0 {
            break;
        }

        let searched_from = raw_request.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        raw_request.extend_from_slice(&chunk[..read]);

        if raw_request[searched_from..]
            .windows(HEAD_TERMINATOR.len())
            .any(|window| window == HEAD_TERMINATOR)
        {
            break;
        }
    }

    if raw_request.is_empty() {
        return Ok(None);
    }

    Ok(Some(raw_request))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    use super::{read_request, serve, ConnectionSettings};
    use crate::servers::http::test_helpers::{announce_request, initialize_container, remote_addr, PASSKEY};

    fn settings(keepalive_timeout: u64) -> ConnectionSettings {
        ConnectionSettings {
            max_request_size: 4096,
            connection_timeout: Duration::from_secs(5),
            keepalive_timeout: Duration::from_secs(keepalive_timeout),
        }
    }

    mod reading_a_request {
        use tokio_test::io::Builder;

        use super::read_request;

        #[tokio::test]
        async fn it_should_stop_at_the_end_of_the_request_head() {
            let mut stream = Builder::new()
                .read(b"GET /announce HTTP/1.1\r\nHost: tracker\r")
                .read(b"\n\r\n")
                .build();

            let raw_request = read_request(&mut stream, 4096).await.unwrap().unwrap();

            assert_eq!(raw_request, b"GET /announce HTTP/1.1\r\nHost: tracker\r\n\r\n");
        }

        #[tokio::test]
        async fn it_should_cut_the_request_at_the_maximum_size() {
            let mut stream: &[u8] = b"GET /announce HTTP/1.1\r\n";

            let raw_request = read_request(&mut stream, 10).await.unwrap().unwrap();

            assert_eq!(raw_request, b"GET /annou");
        }

        #[tokio::test]
        async fn it_should_return_nothing_when_the_client_sends_nothing() {
            let mut stream: &[u8] = b"";

            assert!(read_request(&mut stream, 4096).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn it_should_answer_the_request_and_close_the_connection() {
        let container = initialize_container();
        let (mut client, server) = duplex(8192);

        let connection = tokio::spawn(serve(
            server,
            remote_addr(),
            settings(0),
            container.request_handler.clone(),
            container.metrics.clone(),
        ));

        client.write_all(&announce_request(PASSKEY)).await.unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        connection.await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Connection: Close\r\n"));
        assert!(response.ends_with("5:peers0:e"));

        let stats = container.metrics.snapshot();
        assert_eq!(stats.opened_connections, 1);
        assert_eq!(stats.open_connections, 0);
        assert_eq!(stats.bytes_read, announce_request(PASSKEY).len() as u64);
        assert_eq!(stats.bytes_written, response.len() as u64);
    }

    #[tokio::test]
    async fn it_should_serve_several_requests_on_a_kept_alive_connection() {
        let container = initialize_container();
        let (mut client, server) = duplex(8192);

        let connection = tokio::spawn(serve(
            server,
            remote_addr(),
            settings(5),
            container.request_handler.clone(),
            container.metrics.clone(),
        ));

        for _ in 0..2 {
            client.write_all(&announce_request(PASSKEY)).await.unwrap();
            let mut buffer = vec![0u8; 4096];
            let read = client.read(&mut buffer).await.unwrap();
            let response = String::from_utf8_lossy(&buffer[..read]).into_owned();

            assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(!response.contains("Connection: Close"));
        }

        drop(client);
        connection.await.unwrap();

        assert_eq!(container.metrics.snapshot().requests, 2);
    }
}
