//! The users of the private tracker, indexed by passkey.
//!
//! A [`User`] is shared by the map and by every peer it owns. Removing a user
//! marks it as deleted before unlinking it, so its peers stop being handed out
//! even though they stay in the swarm until they expire.
use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use swarm_tracker_primitives::user::User;
use swarm_tracker_primitives::UserId;
use tracing::{info, warn};

use crate::databases::records::UserRow;

/// Number of users affected by a bulk load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadedUsers {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Debug, Default)]
pub struct Users {
    users: DashMap<String, Arc<User>>,
}

impl Users {
    #[must_use]
    pub fn get(&self, passkey: &str) -> Option<Arc<User>> {
        self.users.get(passkey).map(|user| user.value().clone())
    }

    /// Adds a user that can leech. A known passkey is undeleted instead.
    pub fn add(&self, passkey: &str, user_id: UserId, protect_ip: bool) {
        match self.users.entry(passkey.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                warn!("tried to add already known user {passkey} with id {user_id}");
                entry.get().set_deleted(false);
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(Arc::new(User::new(user_id, true, protect_ip)));
                info!("added user {passkey} with id {user_id}");
            }
        }
    }

    /// Marks the user as deleted and forgets its passkey.
    pub fn remove(&self, passkey: &str) -> bool {
        match self.users.remove(passkey) {
            Some((_, user)) => {
                user.set_deleted(true);
                info!("removed user {passkey} with id {}", user.id());
                true
            }
            None => false,
        }
    }

    pub fn change_passkey(&self, old_passkey: &str, new_passkey: &str) -> bool {
        match self.users.remove(old_passkey) {
            Some((_, user)) => {
                info!("changed passkey from {old_passkey} to {new_passkey} for user {}", user.id());
                self.users.insert(new_passkey.to_string(), user);
                true
            }
            None => {
                warn!("no user with passkey {old_passkey} exists when attempting to change passkey to {new_passkey}");
                false
            }
        }
    }

    pub fn update(&self, passkey: &str, can_leech: bool, protect_ip: bool) -> bool {
        let Some(user) = self.get(passkey) else {
            warn!("no user with passkey {passkey} found when attempting to change leeching status");
            return false;
        };

        user.set_can_leech(can_leech);
        user.set_protected(protect_ip);
        info!("updated user {passkey}");

        true
    }

    /// Replaces the users with the ones loaded from the store.
    ///
    /// Known passkeys keep their `User`, so the peers they own stay linked to
    /// it. Users missing from the load are deleted.
    pub fn load(&self, rows: Vec<UserRow>) -> LoadedUsers {
        let mut loaded = LoadedUsers::default();
        let mut passkeys = HashSet::with_capacity(rows.len());

        for row in rows {
            match self.get(&row.passkey) {
                Some(user) => {
                    user.set_can_leech(row.can_leech);
                    user.set_protected(row.protect_ip);
                    user.set_deleted(false);
                    loaded.updated += 1;
                }
                None => {
                    self.users.insert(
                        row.passkey.clone(),
                        Arc::new(User::new(row.id, row.can_leech, row.protect_ip)),
                    );
                    loaded.added += 1;
                }
            }

            passkeys.insert(row.passkey);
        }

        self.users.retain(|passkey, user| {
            let keep = passkeys.contains(passkey);
            if !keep {
                user.set_deleted(true);
                loaded.removed += 1;
            }
            keep
        });

        loaded
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
