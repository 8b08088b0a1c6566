//! A client for the site endpoints the tracker calls.
//!
//! The tracker only tells the site which free-leech tokens were consumed. The
//! endpoint is configured as a full URL, fixed query params included:
//!
//! ```text
//! https://site.example/tools.php?type=expiretoken&action=ocelot
//! ```
//!
//! The client appends the site password as `key` and the batch as `tokens`.
//! The batch is a comma separated list of `user:torrent` pairs.
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

/// Requests to the site give up after this long.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid site url {url}: {source}")]
    InvalidUrl { url: String, source: url::ParseError },

    #[error("unable to build the http client: {0}")]
    Builder(reqwest::Error),

    #[error("request to the site failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("the site answered with the status {0}")]
    UnexpectedStatus(StatusCode),
}

pub struct Client {
    http_client: HttpClient,
    token_expiry_url: Url,
    site_password: String,
}

impl Client {
    /// # Errors
    ///
    /// Will return an error if the url can't be parsed or if the http client
    /// can't be built.
    pub fn new(token_expiry_url: &str, site_password: &str, timeout: Duration) -> Result<Self, Error> {
        let token_expiry_url = Url::parse(token_expiry_url).map_err(|source| Error::InvalidUrl {
            url: token_expiry_url.to_string(),
            source,
        })?;

        let http_client = HttpClient::builder().timeout(timeout).build().map_err(Error::Builder)?;

        Ok(Self {
            http_client,
            token_expiry_url,
            site_password: site_password.to_string(),
        })
    }

    /// The url the batch is sent to.
    #[must_use]
    pub fn expire_tokens_url(&self, tokens: &str) -> Url {
        let mut url = self.token_expiry_url.clone();

        url.query_pairs_mut()
            .append_pair("key", &self.site_password)
            .append_pair("tokens", tokens);

        url
    }

    /// Tells the site that the tokens in the batch were used.
    ///
    /// It blocks the current thread until the site answers.
    ///
    /// # Errors
    ///
    /// Will return an error if the site can't be reached or if it doesn't
    /// answer with `200 OK`.
    pub fn expire_tokens(&self, tokens: &str) -> Result<(), Error> {
        let response = self.http_client.get(self.expire_tokens_url(tokens)).send()?;

        match response.status() {
            StatusCode::OK => {
                debug!("the site expired the tokens {tokens}");
                Ok(())
            }
            status => Err(Error::UnexpectedStatus(status)),
        }
    }
}
