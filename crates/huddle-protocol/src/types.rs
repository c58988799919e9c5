//! Identity and naming types for Huddle's wire format.
//!
//! Everything here is either sent to clients verbatim (user ids, room
//! names) or used to key the gateway's internal registries (connection
//! ids). The types are thin newtype wrappers, so the compiler keeps a
//! `UserId` from sliding into a slot that wanted a `RoomName` even
//! though both are strings underneath.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, as issued by the identity service.
///
/// This is a "newtype wrapper" around `String`. Why bother?
///
/// 1. **Type safety**: you can't accidentally pass an entity id where a
///    user id is expected, even though both are strings underneath.
/// 2. **Readability**: `fn notify(user: &UserId)` says more than
///    `fn notify(user: &str)`.
///
/// The `#[serde(transparent)]` attribute tells serde to serialize this
/// as just the inner string, not as `{ "0": "u-1" }`. So in JSON a
/// `UserId` is a plain `"u-1"`, which is what clients expect in the
/// `userId` field of every presence and membership event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Builds a user id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id, for embedding into room names and log fields.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unique identifier for one WebSocket connection.
///
/// Allocated from an atomic counter at accept time, unique for the
/// lifetime of the process. One user may hold several of these at once
/// (a browser tab and a phone, say), which is exactly the distinction
/// the presence registry is built around.
///
/// Deliberately **not** serializable: connection ids are internal
/// bookkeeping and never appear in any frame sent to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Room names
// ---------------------------------------------------------------------------

/// The name of a broadcast room, e.g. `project:42` or `user:u-7`.
///
/// Rooms are named, not numbered: the REST layer addresses them by the
/// same deterministic strings the gateway builds, so both sides agree
/// on where an update about task `9` goes without any registration
/// step. Prefer the [`EntityScope::room`] and [`RoomName::user`]
/// constructors over [`RoomName::new`]; the raw constructor exists for
/// names that arrive from the outside (typing relays echo whatever
/// room the client names, and membership checks do the filtering).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    /// Wraps an externally supplied room name verbatim.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The room every connection of `user` is auto-joined to.
    /// Targeted notifications are broadcast here.
    pub fn user(user: &UserId) -> Self {
        Self(format!("user:{user}"))
    }

    /// Splits a scope room back into `(scope, entity id)`.
    ///
    /// Returns `None` for user rooms and free-form names; membership
    /// notifications only exist for entity rooms, and this is the test.
    pub fn entity(&self) -> Option<(EntityScope, &str)> {
        let (prefix, id) = self.0.split_once(':')?;
        let scope = match prefix {
            "project" => EntityScope::Project,
            "task" => EntityScope::Task,
            _ => return None,
        };
        Some((scope, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity scopes
// ---------------------------------------------------------------------------

/// The kind of entity a room is scoped to: a project board or a single
/// task.
///
/// The scope owns every piece of naming derived from it - the room
/// name prefix and the outbound event names - so the strings are
/// spelled in exactly one place. Adding a scope later (say, `team:`)
/// means adding a variant and letting the compiler point at every
/// `match` that needs a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityScope {
    Project,
    Task,
}

impl EntityScope {
    /// The lowercase tag used in room names and event names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
        }
    }

    /// The room for one entity of this scope: `project:<id>` / `task:<id>`.
    pub fn room(&self, id: &str) -> RoomName {
        RoomName(format!("{}:{}", self.tag(), id))
    }

    /// Event name announcing a user joined the entity's room.
    pub fn joined_event(&self) -> &'static str {
        match self {
            Self::Project => "project:user_joined",
            Self::Task => "task:user_joined",
        }
    }

    /// Event name announcing a user left the entity's room.
    pub fn left_event(&self) -> &'static str {
        match self {
            Self::Project => "project:user_left",
            Self::Task => "task:user_left",
        }
    }

    /// Event name carrying a data change for an entity of this scope.
    pub fn updated_event(&self) -> &'static str {
        match self {
            Self::Project => "project:updated",
            Self::Task => "task:updated",
        }
    }
}

impl fmt::Display for EntityScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Tests for ids, room names, and scopes.
    //!
    //! Room names and event names are a contract with the REST layer:
    //! both sides derive them independently, so any drift in the
    //! `<scope>:<id>` scheme silently breaks routing. These tests pin
    //! the exact strings.

    use super::*;

    // =====================================================================
    // Identity types: UserId, ConnectionId
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        // `#[serde(transparent)]` means UserId("u-1") → `"u-1"`,
        // not `{"0":"u-1"}`. Clients read this in every `userId` field.
        let json = serde_json::to_string(&UserId::new("u-1")).unwrap();
        assert_eq!(json, "\"u-1\"");
    }

    #[test]
    fn test_user_id_deserializes_from_plain_string() {
        let uid: UserId = serde_json::from_str("\"u-1\"").unwrap();
        assert_eq!(uid, UserId::new("u-1"));
    }

    #[test]
    fn test_user_id_display_is_raw_id() {
        assert_eq!(UserId::new("alice").to_string(), "alice");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }

    #[test]
    fn test_connection_ids_with_same_value_are_equal() {
        assert_eq!(ConnectionId(3), ConnectionId(3));
        assert_ne!(ConnectionId(3), ConnectionId(4));
    }

    // =====================================================================
    // Room names
    // =====================================================================

    #[test]
    fn test_project_room_name_format() {
        let room = EntityScope::Project.room("42");
        assert_eq!(room.as_str(), "project:42");
    }

    #[test]
    fn test_task_room_name_format() {
        let room = EntityScope::Task.room("9");
        assert_eq!(room.as_str(), "task:9");
    }

    #[test]
    fn test_user_room_name_format() {
        let room = RoomName::user(&UserId::new("u-7"));
        assert_eq!(room.as_str(), "user:u-7");
    }

    #[test]
    fn test_same_entity_yields_same_room() {
        // Deterministic naming is what lets the REST layer address a
        // room it never saw created.
        assert_eq!(EntityScope::Task.room("9"), EntityScope::Task.room("9"));
    }

    #[test]
    fn test_rooms_of_different_scopes_are_distinct() {
        assert_ne!(
            EntityScope::Project.room("9"),
            EntityScope::Task.room("9")
        );
    }

    #[test]
    fn test_room_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomName::new("task:9")).unwrap();
        assert_eq!(json, "\"task:9\"");
    }

    #[test]
    fn test_entity_of_scope_rooms() {
        assert_eq!(
            EntityScope::Project.room("42").entity(),
            Some((EntityScope::Project, "42"))
        );
        assert_eq!(
            EntityScope::Task.room("9").entity(),
            Some((EntityScope::Task, "9"))
        );
    }

    #[test]
    fn test_entity_of_user_room_is_none() {
        let room = RoomName::user(&UserId::new("u-7"));
        assert_eq!(room.entity(), None);
    }

    #[test]
    fn test_entity_of_free_form_name_is_none() {
        assert_eq!(RoomName::new("lobby").entity(), None);
        assert_eq!(RoomName::new("team:7").entity(), None);
    }

    #[test]
    fn test_entity_id_may_contain_colons() {
        // Only the first colon splits; ids pass through untouched.
        let room = RoomName::new("task:a:b");
        assert_eq!(room.entity(), Some((EntityScope::Task, "a:b")));
    }

    // =====================================================================
    // Entity scopes
    // =====================================================================

    #[test]
    fn test_scope_tags() {
        assert_eq!(EntityScope::Project.tag(), "project");
        assert_eq!(EntityScope::Task.tag(), "task");
    }

    #[test]
    fn test_scope_event_names() {
        assert_eq!(EntityScope::Project.joined_event(), "project:user_joined");
        assert_eq!(EntityScope::Project.left_event(), "project:user_left");
        assert_eq!(EntityScope::Project.updated_event(), "project:updated");
        assert_eq!(EntityScope::Task.joined_event(), "task:user_joined");
        assert_eq!(EntityScope::Task.left_event(), "task:user_left");
        assert_eq!(EntityScope::Task.updated_event(), "task:updated");
    }
}
