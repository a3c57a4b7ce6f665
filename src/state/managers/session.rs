//! Session registry: live connections and their display names.

use crate::state::ConnId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Concurrent map from connection identity to nickname.
///
/// An entry exists iff the connection is registered. Nickname validation
/// happens upstream; this type stores whatever it is given.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConnId, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the nickname for `conn`.
    ///
    /// Overwriting is how a rename happens, so readers never observe a gap
    /// between the old and the new name.
    pub fn register(&self, conn: ConnId, nickname: impl Into<String>) {
        self.sessions.write().insert(conn, nickname.into());
    }

    /// Remove `conn`. Unregistering an absent connection is a no-op.
    pub fn unregister(&self, conn: ConnId) {
        self.sessions.write().remove(&conn);
    }

    /// Current nickname for `conn`, or an empty string when absent.
    pub fn lookup_nickname(&self, conn: ConnId) -> String {
        self.sessions.read().get(&conn).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub fn is_registered(&self, conn: ConnId) -> bool {
        self.sessions.read().contains_key(&conn)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Snapshot of all registered nicknames, sorted.
    #[cfg(test)]
    pub fn nicknames(&self) -> Vec<String> {
        let mut nicks: Vec<String> = self.sessions.read().values().cloned().collect();
        nicks.sort();
        nicks
    }
}
