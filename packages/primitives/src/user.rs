//! Users of the private tracker.
//!
//! A [`User`] is shared by every peer it owns. Its flags are written by the
//! administrative channel and the bulk loader while announces read them, and
//! its live counters are adjusted by whoever inserts, migrates or evicts one
//! of its peers. All fields are atomics so the user can be shared with an
//! `Arc` without a lock of its own.
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::UserId;

#[derive(Debug)]
pub struct User {
    id: UserId,
    deleted: AtomicBool,
    can_leech: AtomicBool,
    protect_ip: AtomicBool,
    leeching: AtomicU32,
    seeding: AtomicU32,
}

impl User {
    #[must_use]
    pub fn new(id: UserId, can_leech: bool, protect_ip: bool) -> Self {
        Self {
            id,
            deleted: AtomicBool::new(false),
            can_leech: AtomicBool::new(can_leech),
            protect_ip: AtomicBool::new(protect_ip),
            leeching: AtomicU32::new(0),
            seeding: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Relaxed)
    }

    pub fn set_deleted(&self, deleted: bool) {
        self.deleted.store(deleted, Ordering::Relaxed);
    }

    #[must_use]
    pub fn can_leech(&self) -> bool {
        self.can_leech.load(Ordering::Relaxed)
    }

    pub fn set_can_leech(&self, can_leech: bool) {
        self.can_leech.store(can_leech, Ordering::Relaxed);
    }

    /// IP protected users never have their address written to the store.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        self.protect_ip.load(Ordering::Relaxed)
    }

    pub fn set_protected(&self, protect_ip: bool) {
        self.protect_ip.store(protect_ip, Ordering::Relaxed);
    }

    #[must_use]
    pub fn leeching(&self) -> u32 {
        self.leeching.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn seeding(&self) -> u32 {
        self.seeding.load(Ordering::Relaxed)
    }

    pub fn incr_leeching(&self) {
        self.leeching.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decr_leeching(&self) {
        saturating_decrement(&self.leeching);
    }

    pub fn incr_seeding(&self) {
        self.seeding.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decr_seeding(&self) {
        saturating_decrement(&self.seeding);
    }
}

/// Decrements the counter without wrapping below zero.
///
/// # Panics
///
/// In debug builds, when the counter is already zero. Every decrement must
/// pair with an earlier increment, a zero counter means they drifted apart.
pub fn saturating_decrement(counter: &AtomicU32) {
    // The closure never returns `None`, so the update cannot fail.
    let previous = counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |value| Some(value.saturating_sub(1)))
        .unwrap_or_default();

    debug_assert!(previous > 0, "live peer counter decremented below zero");
}
