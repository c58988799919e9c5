//! Presence, room membership, and broadcast dispatch for Huddle.
//!
//! All connection state lives in one Tokio task (actor model) reached
//! through [`HubHandle`]. The hub owns who is online, who is in which
//! room, and the outbound channel of every connection, so presence
//! edges and membership notifications come out in a single consistent
//! order.
//!
//! # Key types
//!
//! - [`HubHandle`] - send commands to the running hub
//! - [`PresenceRegistry`] - connection-counted online/offline tracking
//! - [`RoomRegistry`] - bidirectional room membership index
//! - [`spawn_hub`] - start the hub task

mod error;
mod hub;
mod presence;
mod rooms;

pub use error::HubError;
pub use hub::{spawn_hub, FrameSender, HubHandle};
pub use presence::PresenceRegistry;
pub use rooms::RoomRegistry;
