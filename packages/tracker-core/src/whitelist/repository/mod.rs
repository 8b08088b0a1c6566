//! Repository implementations for the client whitelist.
pub mod in_memory;
