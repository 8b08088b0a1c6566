//! Typed params of the tracker actions.
pub mod announce;
pub mod scrape;
