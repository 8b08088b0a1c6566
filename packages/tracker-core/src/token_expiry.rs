//! Notifications to the site about consumed free-leech tokens.
//!
//! When a user completes a torrent with a token, the site must mark the token
//! as used. The pairs are batched as `user:torrent` separated by commas. A
//! batch is handed to the [`SiteNotifier`] when it grows beyond the configured
//! threshold or when the scheduler flushes it. Batches are sent in order by a
//! worker thread that retries a failed batch until the site accepts it.
use std::sync::Arc;
use std::time::Duration;

use mockall::automock;
use parking_lot::Mutex;
use swarm_tracker_configuration::Core;
use swarm_tracker_primitives::{TorrentId, UserId};
use tracing::info;

use crate::databases::queue::{start_drain, FlushQueue};

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// The consumer side, used by the announce handler.
#[automock]
pub trait TokenExpiry: Sync + Send {
    fn expire_token(&self, torrent_id: TorrentId, user_id: UserId);

    /// Sends the pending pairs, even if the batch is small.
    fn flush(&self);

    /// Whether every batch has been delivered.
    fn all_clear(&self) -> bool;
}

/// Delivers a batch of expired tokens to the site.
#[automock]
pub trait SiteNotifier: Sync + Send {
    /// # Errors
    ///
    /// Will return an error if the site didn't accept the batch.
    fn expire_tokens(&self, tokens: &str) -> Result<(), NotifyError>;
}

/// A notifier for trackers without a site to notify. It accepts every batch.
#[derive(Debug, Default)]
pub struct DisabledNotifier;

impl SiteNotifier for DisabledNotifier {
    fn expire_tokens(&self, tokens: &str) -> Result<(), NotifyError> {
        tracing::debug!("token expiry is disabled, discarding tokens: {tokens}");
        Ok(())
    }
}

pub struct TokenExpiryQueue {
    notifier: Arc<dyn SiteNotifier>,
    pending: Mutex<String>,
    batches: Arc<FlushQueue>,
    batch_threshold: usize,
    readonly: bool,
    retry_backoff: Duration,
}

impl TokenExpiryQueue {
    #[must_use]
    pub fn new(config: &Core, notifier: Arc<dyn SiteNotifier>) -> Self {
        Self {
            notifier,
            pending: Mutex::default(),
            batches: Arc::new(FlushQueue::new("tokens-expiry")),
            batch_threshold: config.site.token_batch_threshold,
            readonly: config.database.readonly,
            retry_backoff: Duration::from_secs(config.write_buffer.retry_backoff),
        }
    }

    /// The pairs waiting for the next batch.
    #[must_use]
    pub fn pending(&self) -> String {
        self.pending.lock().clone()
    }

    fn send(&self, batch: String) {
        if self.readonly {
            return;
        }

        if self.batches.push(batch) {
            let notifier = self.notifier.clone();
            start_drain(&self.batches, self.retry_backoff, move |tokens| notifier.expire_tokens(tokens));
        }
    }
}

impl TokenExpiry for TokenExpiryQueue {
    fn expire_token(&self, torrent_id: TorrentId, user_id: UserId) {
        let overloaded = {
            let mut pending = self.pending.lock();

            if !pending.is_empty() {
                pending.push(',');
            }
            pending.push_str(&format!("{user_id}:{torrent_id}"));

            (pending.len() > self.batch_threshold).then(|| std::mem::take(&mut *pending))
        };

        if let Some(batch) = overloaded {
            info!("flushing overloaded token buffer");
            self.send(batch);
        }
    }

    fn flush(&self) {
        let batches = self.batches.len();
        if batches > 0 {
            info!("token expire queue size: {batches}");
        }

        let batch = std::mem::take(&mut *self.pending.lock());

        if !batch.is_empty() {
            self.send(batch);
        }
    }

    fn all_clear(&self) -> bool {
        self.batches.is_empty()
    }
}
