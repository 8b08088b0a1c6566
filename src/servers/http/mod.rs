//! HTTP tracker.
//!
//! A plain TCP server. Each connection is read until the end of the request
//! head, the raw request is handed to the
//! [`RequestHandler`](bittorrent_tracker_core::request_handler::RequestHandler)
//! and the response is written back:
//!
//! ```text
//! GET /<passkey>/announce?info_hash=...&peer_id=...&port=6881&left=0 HTTP/1.1
//! ```
//!
//! Bodies are never read: every request of the protocol is a `GET`.
//!
//! Connections are closed after the response unless keep-alive is enabled
//! with `http_tracker.keepalive_timeout` and the client asked for it. At most
//! `http_tracker.max_connections` connections are served at the same time.
pub mod connection;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;
