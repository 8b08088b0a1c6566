//! Core tracker errors.
//!
//! Every error a client can get is a [`RequestError`]. The `Display` text of
//! each variant is the `failure reason` sent back in the bencoded error
//! response, so the messages are part of the protocol and must not change.
use bittorrent_http_protocol::v1::request::ParseRequestError;
use bittorrent_http_protocol::v1::responses;

/// Errors of a tracker request.
#[allow(clippy::module_name_repetitions)]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The raw request could not be parsed.
    #[error("{source}")]
    MalformedRequest {
        #[from]
        source: ParseRequestError,
    },

    /// The tracker is reloading its lists or shutting down.
    #[error("The tracker is temporarily unavailable.")]
    TrackerUnavailable,

    #[error("Invalid action")]
    InvalidAction,

    /// Wrong password for the `update` or `report` actions.
    #[error("Authentication failure")]
    AuthenticationFailure,

    /// The torrent is not known. A recently deleted torrent carries the
    /// deletion reason.
    #[error("{}", unregistered_torrent_message(.reason.as_deref()))]
    UnregisteredTorrent { reason: Option<String> },

    #[error("Passkey not found")]
    PasskeyNotFound,

    #[error("Your client does not support compact announces")]
    UnsupportedClient,

    #[error("Invalid peer ID")]
    InvalidPeerId,

    #[error("Your client is not on the whitelist")]
    NotWhitelisted,

    /// Neither the connection address nor the reported ones are routable.
    #[error("Invalid IP detected.")]
    InvalidIp,

    /// The user is not allowed to download.
    #[error("Access denied, leeching forbidden")]
    AccessDenied,
}

fn unregistered_torrent_message(reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!("Unregistered torrent: {reason}"),
        _ => "Unregistered torrent".to_string(),
    }
}

impl From<RequestError> for responses::error::Error {
    fn from(err: RequestError) -> Self {
        responses::error::Error::new(&err.to_string())
    }
}
