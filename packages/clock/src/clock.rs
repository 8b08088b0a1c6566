use std::cell::Cell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use swarm_tracker_primitives::DurationSinceUnixEpoch;

/// Trait for types that can be used as a timestamp clock.
pub trait Time: Sized {
    fn now() -> DurationSinceUnixEpoch;

    fn dbg_clock_type() -> String;

    #[must_use]
    fn now_add(add_time: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_add(*add_time)
    }

    #[must_use]
    fn now_sub(sub_time: &Duration) -> Option<DurationSinceUnixEpoch> {
        Self::now().checked_sub(*sub_time)
    }
}

/// A clock reading the system time.
#[derive(Debug)]
pub struct Working;

impl Time for Working {
    fn now() -> DurationSinceUnixEpoch {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
    }

    fn dbg_clock_type() -> String {
        "Working".to_owned()
    }
}

/// A clock that only moves when a test moves it.
///
/// The time is stored per thread, so each test running on its own thread sees
/// its own clock.
#[derive(Debug)]
pub struct Stopped;

thread_local!(static FIXED_TIME: Cell<DurationSinceUnixEpoch> = const { Cell::new(Duration::ZERO) });

impl Time for Stopped {
    fn now() -> DurationSinceUnixEpoch {
        FIXED_TIME.with(Cell::get)
    }

    fn dbg_clock_type() -> String {
        "Stopped".to_owned()
    }
}

impl Stopped {
    /// Sets the time of the current thread.
    pub fn local_set(unix_time: &DurationSinceUnixEpoch) {
        FIXED_TIME.with(|time| time.set(*unix_time));
    }

    /// Moves the time of the current thread forward.
    pub fn local_add(duration: &Duration) {
        FIXED_TIME.with(|time| time.set(time.get().saturating_add(*duration)));
    }

    /// Moves the time of the current thread backwards, stopping at the epoch.
    pub fn local_sub(duration: &Duration) {
        FIXED_TIME.with(|time| time.set(time.get().saturating_sub(*duration)));
    }

    /// Sets the time of the current thread back to the Unix Epoch.
    pub fn local_reset() {
        Self::local_set(&Duration::ZERO);
    }
}
