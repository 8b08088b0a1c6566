//! Command line arguments and configuration loading.
//!
//! The configuration is taken, in order of precedence, from:
//!
//! 1. The TOML in the `SWARM_TRACKER_CONFIG_TOML` env var.
//! 2. The file passed with `--config` or in the `SWARM_TRACKER_CONFIG_TOML_PATH`
//!    env var.
//! 3. The default file `./share/default/config/tracker.toml`.
//!
//! The `SWARM_TRACKER_CONFIG_OVERRIDE_*` env vars are applied on top.
use clap::Parser;
use swarm_tracker_configuration::{Configuration, Info, ENV_VAR_CONFIG_TOML, ENV_VAR_CONFIG_TOML_PATH};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "swarm-tracker", version, about = "A private BitTorrent tracker")]
pub struct Args {
    /// Path of the TOML configuration file.
    #[arg(short, long, env = ENV_VAR_CONFIG_TOML_PATH)]
    pub config: Option<String>,

    /// The whole configuration as a TOML string.
    #[arg(long, env = ENV_VAR_CONFIG_TOML, hide_env_values = true)]
    pub config_toml: Option<String>,
}

impl Args {
    #[must_use]
    pub fn info(&self) -> Info {
        Info::new(self.config_toml.clone(), self.config.clone())
    }
}

/// It loads the application configuration.
///
/// # Panics
///
/// Will panic if the configuration can't be loaded. The tracker can't start
/// with a configuration it doesn't understand.
#[must_use]
pub fn initialize_configuration(args: &Args) -> Configuration {
    Configuration::load(&args.info()).expect("Error loading configuration from sources")
}
