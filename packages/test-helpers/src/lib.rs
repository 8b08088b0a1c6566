//! Helpers shared by the tests of the swarm tracker packages.
pub mod configuration;
pub mod random;
