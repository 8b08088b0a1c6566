//! Setup of the application: configuration, logging and the jobs.
pub mod app;
pub mod config;
pub mod jobs;
pub mod logging;
pub mod token_expiry;
