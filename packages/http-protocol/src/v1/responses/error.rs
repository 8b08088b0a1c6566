//! Failure responses.
//!
//! Clients show the `failure reason` to the user. The intervals ask them not
//! to retry for an hour and a half.
use super::Response;
use crate::bencode;

/// Seconds clients must wait before retrying after a failure.
pub const FAILURE_INTERVAL: i64 = 5400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub failure_reason: String,
}

impl Error {
    #[must_use]
    pub fn new(failure_reason: &str) -> Self {
        Self {
            failure_reason: failure_reason.to_string(),
        }
    }

    /// `d14:failure reason<len>:<msg>12:min intervali5400e8:intervali5400ee`
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        let mut body = b"d".to_vec();
        body.extend(bencode::str(b"failure reason"));
        body.extend(bencode::str(self.failure_reason.as_bytes()));
        body.extend(bencode::str(b"min interval"));
        body.extend(bencode::int(FAILURE_INTERVAL));
        body.extend(bencode::str(b"interval"));
        body.extend(bencode::int(FAILURE_INTERVAL));
        body.push(b'e');
        body
    }
}

impl From<Error> for Response {
    fn from(error: Error) -> Self {
        Response::plain(error.body())
    }
}
