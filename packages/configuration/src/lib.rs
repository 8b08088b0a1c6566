//! Configuration data structures for the swarm tracker.
//!
//! The configuration is loaded, from lowest to highest priority, from:
//!
//! - The defaults in this crate.
//! - A TOML file (or a TOML string given through an env var).
//! - Env vars with the prefix [`ENV_VAR_CONFIG_OVERRIDE_PREFIX`]. Sections are
//!   separated by `__`, for example
//!   `SWARM_TRACKER_CONFIG_OVERRIDE_CORE__SECRETS__SITE_PASSWORD`.
//!
//! A complete configuration with the default values:
//!
//! ```toml
//! [logging]
//! threshold = "info"
//!
//! [core.announce_policy]
//! interval = 1800
//! max_interval_bonus = 600
//! numwant_limit = 50
//!
//! [core.tracker_policy]
//! peers_timeout = 7200
//! del_reason_lifetime = 86400
//! reap_peers_interval = 1800
//!
//! [core.database]
//! driver = "sqlite3"
//! path = "./storage/tracker/lib/database/sqlite3.db"
//! readonly = false
//!
//! [core.write_buffer]
//! schedule_interval = 3
//! peer_queue_limit = 1000
//! retry_backoff = 3
//!
//! [core.secrets]
//! site_password = "00000000000000000000000000000000"
//! report_password = "00000000000000000000000000000000"
//!
//! [core.site]
//! token_batch_threshold = 350
//!
//! [http_tracker]
//! bind_address = "0.0.0.0:34000"
//! max_connections = 1024
//! max_request_size = 4096
//! connection_timeout = 10
//! keepalive_timeout = 0
//! ```
pub mod core;
pub mod http_tracker;
pub mod logging;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use swarm_tracker_located_error::{Located, LocatedError};
use thiserror::Error;

pub use crate::core::{AnnouncePolicy, Core, Database, Driver, Secrets, Site, TrackerPolicy, WriteBuffer};
pub use crate::http_tracker::HttpTracker;
pub use crate::logging::{Logging, Threshold};

/// Prefix for env vars that overwrite configuration options.
pub const ENV_VAR_CONFIG_OVERRIDE_PREFIX: &str = "SWARM_TRACKER_CONFIG_OVERRIDE_";

/// Env var with the whole TOML configuration.
pub const ENV_VAR_CONFIG_TOML: &str = "SWARM_TRACKER_CONFIG_TOML";

/// Env var with the path of the TOML configuration file.
pub const ENV_VAR_CONFIG_TOML_PATH: &str = "SWARM_TRACKER_CONFIG_TOML_PATH";

/// Default path of the TOML configuration file.
pub const DEFAULT_PATH_CONFIG: &str = "./share/default/config/tracker.toml";

/// Where the configuration comes from.
#[derive(Debug, Default, Clone)]
pub struct Info {
    config_toml: Option<String>,
    config_toml_path: String,
}

impl Info {
    /// Builds the configuration info.
    ///
    /// A TOML string, when present, wins over the file path.
    #[must_use]
    pub fn new(config_toml: Option<String>, config_toml_path: Option<String>) -> Self {
        Self {
            config_toml,
            config_toml_path: config_toml_path.unwrap_or_else(|| DEFAULT_PATH_CONFIG.to_string()),
        }
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed processing the configuration: {source}")]
    ConfigError { source: LocatedError<'static, figment::Error> },
}

impl From<figment::Error> for Error {
    #[track_caller]
    fn from(err: figment::Error) -> Self {
        Self::ConfigError {
            source: Located(err).into(),
        }
    }
}

/// Core configuration for the tracker.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Default, Clone)]
pub struct Configuration {
    /// Logging configuration.
    #[serde(default)]
    pub logging: Logging,

    /// Core configuration.
    #[serde(default)]
    pub core: Core,

    /// The HTTP tracker transport.
    #[serde(default)]
    pub http_tracker: HttpTracker,
}

impl Configuration {
    /// Loads the configuration from the configuration file or string, and
    /// applies the env var overrides.
    ///
    /// # Errors
    ///
    /// Will return an error if a provider can't be read or the result does not
    /// match the configuration structure.
    pub fn load(info: &Info) -> Result<Configuration, Error> {
        let figment = if let Some(config_toml) = &info.config_toml {
            Figment::from(Serialized::defaults(Configuration::default())).merge(Toml::string(config_toml))
        } else {
            Figment::from(Serialized::defaults(Configuration::default())).merge(Toml::file(&info.config_toml_path))
        };

        let figment = figment.merge(Env::prefixed(ENV_VAR_CONFIG_OVERRIDE_PREFIX).split("__"));

        let config: Configuration = figment.extract()?;

        tracing::debug!("configuration loaded");

        Ok(config)
    }

    /// Encodes the configuration to TOML.
    ///
    /// # Panics
    ///
    /// Will panic if it can't be converted to TOML.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string(self).expect("Could not encode TOML value")
    }
}
