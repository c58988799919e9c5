//! Connection-counted presence tracking.
//!
//! A user is "online" while at least one of their connections is
//! registered. Users open the app in several tabs or devices at once,
//! so presence cannot follow individual sockets: the registry counts
//! connections per user and reports an edge only on the first
//! connection up and the last connection down. Those edges are what
//! drive the `user:online` / `user:offline` broadcasts.

use std::collections::{HashMap, HashSet};

use huddle_protocol::{ConnectionId, UserId};

/// Tracks which users are online and through which connections.
///
/// Plain data, no locking: the hub actor owns the registry and is the
/// only code that touches it.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// Live connections per user. A user with an entry is online;
    /// empty sets are removed rather than left behind.
    online: HashMap<UserId, HashSet<ConnectionId>>,
}

impl PresenceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection for `user`.
    ///
    /// Returns `true` only when this is the user's first live
    /// connection, i.e. the moment they come online.
    pub fn register(&mut self, user: &UserId, conn: ConnectionId) -> bool {
        let conns = self.online.entry(user.clone()).or_default();
        let came_online = conns.is_empty();
        conns.insert(conn);
        came_online
    }

    /// Drops a connection for `user`.
    ///
    /// Returns `true` only when this was the user's last live
    /// connection, i.e. the moment they go offline. Connections the
    /// registry never saw are ignored and never produce an edge.
    pub fn unregister(&mut self, user: &UserId, conn: ConnectionId) -> bool {
        let Some(conns) = self.online.get_mut(user) else {
            return false;
        };
        if !conns.remove(&conn) {
            return false;
        }
        if conns.is_empty() {
            self.online.remove(user);
            return true;
        }
        false
    }

    /// Whether the user has at least one live connection.
    pub fn is_online(&self, user: &UserId) -> bool {
        self.online.contains_key(user)
    }

    /// Number of live connections held by `user`.
    pub fn connection_count(&self, user: &UserId) -> usize {
        self.online.get(user).map_or(0, HashSet::len)
    }

    /// All users currently online, in no particular order.
    pub fn online_users(&self) -> Vec<UserId> {
        self.online.keys().cloned().collect()
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.online.len()
    }
}
