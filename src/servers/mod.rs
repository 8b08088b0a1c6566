//! Servers. The tracker only speaks HTTP.
pub mod http;
