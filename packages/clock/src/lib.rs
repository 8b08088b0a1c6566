//! Time related functions and types.
//!
//! The tracker needs the current time to stamp announces and to decide when a
//! peer or a deletion reason has expired. Reading the system clock directly
//! would make those rules untestable, so every crate declares a
//! `CurrentClock` alias:
//!
//! ```rust,ignore
//! #[cfg(not(test))]
//! pub(crate) type CurrentClock = swarm_tracker_clock::clock::Working;
//!
//! #[cfg(test)]
//! pub(crate) type CurrentClock = swarm_tracker_clock::clock::Stopped;
//! ```
//!
//! The [`Working`](clock::Working) clock reads the system time while the
//! [`Stopped`](clock::Stopped) clock returns a per-thread time that tests set
//! explicitly.
pub mod clock;
pub mod conv;
