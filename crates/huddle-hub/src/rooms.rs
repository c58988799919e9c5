//! Room membership bookkeeping.
//!
//! Rooms here are just named fan-out groups; nothing is created or
//! destroyed explicitly. A room exists while it has members and
//! vanishes when the last one leaves. The registry keeps the mapping
//! in both directions so that a disconnect can tear down every
//! membership of a connection without scanning all rooms.

use std::collections::{HashMap, HashSet};

use huddle_protocol::{ConnectionId, RoomName};

/// Bidirectional connection-to-room membership index.
///
/// Like [`PresenceRegistry`](crate::PresenceRegistry), this is plain
/// data owned by the hub actor; no locking.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Members of each room. Rooms with no members are removed.
    members: HashMap<RoomName, HashSet<ConnectionId>>,
    /// Rooms each connection has joined. The reverse of `members`,
    /// kept in lockstep with it.
    joined: HashMap<ConnectionId, HashSet<RoomName>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn` to `room`, creating the room if needed.
    ///
    /// Returns `false` if the connection was already a member. Joining
    /// twice is not an error; it just does nothing.
    pub fn join(&mut self, conn: ConnectionId, room: RoomName) -> bool {
        if !self.members.entry(room.clone()).or_default().insert(conn) {
            return false;
        }
        self.joined.entry(conn).or_default().insert(room);
        true
    }

    /// Removes `conn` from `room`.
    ///
    /// Returns `false` if the connection was not a member. As with
    /// [`join`](Self::join), leaving a room you are not in is a no-op,
    /// not an error.
    pub fn leave(&mut self, conn: ConnectionId, room: &RoomName) -> bool {
        let Some(conns) = self.members.get_mut(room) else {
            return false;
        };
        if !conns.remove(&conn) {
            return false;
        }
        if conns.is_empty() {
            self.members.remove(room);
        }
        if let Some(rooms) = self.joined.get_mut(&conn) {
            rooms.remove(room);
            if rooms.is_empty() {
                self.joined.remove(&conn);
            }
        }
        true
    }

    /// Removes `conn` from every room it joined and returns those
    /// rooms. This is the disconnect path: the handler does not know
    /// (or care) which rooms the connection accumulated.
    pub fn remove_connection(&mut self, conn: ConnectionId) -> Vec<RoomName> {
        let Some(rooms) = self.joined.remove(&conn) else {
            return Vec::new();
        };
        for room in &rooms {
            if let Some(conns) = self.members.get_mut(room) {
                conns.remove(&conn);
                if conns.is_empty() {
                    self.members.remove(room);
                }
            }
        }
        rooms.into_iter().collect()
    }

    /// Members of `room`, or `None` if the room has none (and thus
    /// does not exist).
    pub fn members(&self, room: &RoomName) -> Option<&HashSet<ConnectionId>> {
        self.members.get(room)
    }

    /// Whether `conn` is currently in `room`.
    pub fn is_member(&self, conn: ConnectionId, room: &RoomName) -> bool {
        self.members
            .get(room)
            .is_some_and(|conns| conns.contains(&conn))
    }

    /// Rooms `conn` has joined, or `None` if it joined none.
    pub fn rooms_of(&self, conn: ConnectionId) -> Option<&HashSet<RoomName>> {
        self.joined.get(&conn)
    }

    /// Number of rooms that currently have members.
    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}
