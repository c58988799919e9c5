//! The wire frame and the payloads that travel inside it.
//!
//! Every message in either direction is one JSON object with the same
//! two-field shape:
//!
//! ```text
//! { "event": "task:updated", "data": { ... } }
//! ```
//!
//! The `event` string selects a handler; `data` is the event-specific
//! payload. Keeping the envelope this small is deliberate: the gateway
//! routes on `event` alone and never needs to understand a payload it
//! is merely relaying (entity updates pass through byte-for-byte).
//!
//! Payload structs in this module document the `data` shapes. Inbound
//! ones ([`EntityRef`], [`TypingRequest`]) are what the router parses;
//! outbound ones ([`PresencePayload`], [`MembershipPayload`], ...) are
//! what the hub emits. All of them rename to camelCase on the wire
//! because that is what the JavaScript clients speak.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{EntityScope, RoomName, UserId};

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Names of the fixed (scope-independent) events.
///
/// Scope-derived names (`project:user_joined`, `task:updated`, ...)
/// come from [`EntityScope`](crate::EntityScope) instead, so the
/// `<scope>:<suffix>` scheme is spelled in one place.
pub mod event {
    /// Server → client: handshake acknowledgement after registration.
    pub const CONNECTED: &str = "connected";
    /// Server → client: a user's first connection appeared.
    pub const USER_ONLINE: &str = "user:online";
    /// Server → client: a user's last connection went away.
    pub const USER_OFFLINE: &str = "user:offline";
    /// Both directions: typing indicator (client reports, server relays).
    pub const TYPING: &str = "typing";
    /// Server → client: targeted notification for one user.
    pub const NOTIFICATION: &str = "notification";

    /// Client → server: enter a project room.
    pub const JOIN_PROJECT: &str = "join:project";
    /// Client → server: enter a task room.
    pub const JOIN_TASK: &str = "join:task";
    /// Client → server: leave a project room.
    pub const LEAVE_PROJECT: &str = "leave:project";
    /// Client → server: leave a task room.
    pub const LEAVE_TASK: &str = "leave:task";
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// The top-level wire format. Every message on the wire is a `Frame`.
///
/// `data` defaults to `null` when absent, so `{"event":"ping"}` is a
/// valid frame. Unknown `event` strings are a routing concern, not a
/// parse error: a frame with an event nobody registered still
/// deserializes fine and gets dropped later with a debug log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Which event this is, e.g. `"join:task"` or `"user:online"`.
    pub event: String,

    /// Event-specific payload. Opaque at this layer.
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Milliseconds since the Unix epoch, for the `timestamp` field every
/// outbound payload carries. Falls back to 0 if the clock reads before
/// the epoch rather than failing an emit over it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Inbound payloads (client → server)
// ---------------------------------------------------------------------------

/// Payload of `join:project` / `join:task` / `leave:project` /
/// `leave:task`: which entity's room to enter or leave.
///
/// Ids are strings on the wire. Extra fields are ignored rather than
/// rejected; old clients may send more than we read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: String,
}

/// Payload of an inbound `typing` frame.
///
/// The client names the room and the form field it is typing in; it
/// does **not** name itself. The gateway stamps the authenticated user
/// id when relaying, so a client cannot impersonate another user's
/// typing indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub room_name: RoomName,
    pub field: String,
    pub is_typing: bool,
}

// ---------------------------------------------------------------------------
// Outbound payloads (server → client)
// ---------------------------------------------------------------------------

/// Payload of `connected`, `user:online`, and `user:offline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub user_id: UserId,
    pub timestamp: u64,
}

/// Payload of `<scope>:user_joined` / `<scope>:user_left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub user_id: UserId,
    pub entity_id: String,
    pub timestamp: u64,
}

/// Payload of an outbound (relayed) `typing` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub user_id: UserId,
    pub room_name: RoomName,
    pub field: String,
    pub is_typing: bool,
    pub timestamp: u64,
}

/// Payload of `<scope>:updated`, pushed by the REST layer after a
/// write commits. The gateway relays `data` without looking inside.
///
/// `kind` serializes as `type` (`"type"` is not a usable field name in
/// Rust, and the clients already expect that key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdatePayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub entity_id: String,
    pub data: Value,
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Parsed client commands
// ---------------------------------------------------------------------------

/// An inbound frame after parsing: the three things a client may ask
/// the gateway to do.
///
/// The router turns `(event, data)` pairs into these; everything past
/// the router works with typed commands and never re-reads raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Enter the room for one project or task.
    Join { scope: EntityScope, id: String },

    /// Leave the room for one project or task.
    Leave { scope: EntityScope, id: String },

    /// Relay a typing indicator to the other members of `room`.
    Typing {
        room: RoomName,
        field: String,
        is_typing: bool,
    },
}

// =========================================================================
// Tests
// =========================================================================
