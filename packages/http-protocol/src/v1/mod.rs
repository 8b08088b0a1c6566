//! Version 1 of the tracker HTTP protocol.
//!
//! Requests carry the user's passkey in the path:
//!
//! ```text
//! GET /<passkey>/announce?info_hash=...&peer_id=...&port=6881 HTTP/1.1
//! ```
//!
//! The [`request`] module parses the raw request, the [`requests`] module
//! extracts the typed params of each action and the [`responses`] module
//! renders the bencoded replies.
pub mod query;
pub mod request;
pub mod requests;
pub mod responses;
