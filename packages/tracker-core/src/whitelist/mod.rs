//! This module contains the logic to manage the client whitelist.
//!
//! The whitelist holds peer id prefixes of the allowed clients, for example
//! `-qB46` for qBittorrent 4.6. When the list is empty every client is
//! allowed. Otherwise the peer id of an announce must start with one of the
//! prefixes.
//!
//! The module is organized into the following submodules:
//!
//! - **`authorization`**: Checks a peer id against the list.
//! - **`manager`**: Loads the list from the store and applies the changes sent
//!   by the site.
//! - **`repository`**: The in-memory list.
pub mod authorization;
pub mod manager;
pub mod repository;
