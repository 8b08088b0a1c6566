//! The notifier that tells the site which free-leech tokens were used.
use std::sync::Arc;

use bittorrent_tracker_core::token_expiry::{DisabledNotifier, NotifyError, SiteNotifier, TokenExpiry, TokenExpiryQueue};
use swarm_tracker_configuration::Core;
use swarm_tracker_site_client::{Client, DEFAULT_TIMEOUT};
use tracing::{info, warn};

/// Sends the batches to the site endpoint.
pub struct SiteTokenNotifier {
    client: Client,
}

impl SiteTokenNotifier {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl SiteNotifier for SiteTokenNotifier {
    fn expire_tokens(&self, tokens: &str) -> Result<(), NotifyError> {
        self.client.expire_tokens(tokens)?;
        Ok(())
    }
}

/// It builds the token expiry queue. Expirations are only logged when the
/// site endpoint is not configured.
///
/// # Panics
///
/// Will panic if the configured endpoint is not a valid url.
#[must_use]
pub fn initialize_token_expiry(config: &Core) -> Arc<dyn TokenExpiry> {
    let notifier: Arc<dyn SiteNotifier> = match &config.site.token_expiry_url {
        Some(url) => {
            let client = Client::new(url, &config.secrets.site_password, DEFAULT_TIMEOUT)
                .expect("the token expiry url of the site should be valid");

            info!("token expirations are sent to {url}");

            Arc::new(SiteTokenNotifier::new(client))
        }
        None => {
            warn!("the token expiry url is not set, token expirations won't reach the site");

            Arc::new(DisabledNotifier)
        }
    };

    Arc::new(TokenExpiryQueue::new(config, notifier))
}
