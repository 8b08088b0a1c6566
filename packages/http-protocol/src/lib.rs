//! Primitive types and functions for the private `BitTorrent` HTTP tracker
//! protocol.
//!
//! - [`bencode`]: the two bencode encoders the responses need.
//! - [`percent_encoding`]: decoding of percent-escaped binary query values.
//! - [`ip`]: classification of client supplied addresses.
//! - [`v1`]: the request parser and the response bodies.
pub mod bencode;
pub mod ip;
pub mod percent_encoding;
pub mod v1;
