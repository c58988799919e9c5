//! Wire protocol for Huddle.
//!
//! This crate defines the "language" that clients and the gateway speak:
//!
//! - **Types** ([`UserId`], [`RoomName`], [`EntityScope`], ...) -
//!   identities and the deterministic room-naming scheme.
//! - **Frames** ([`Frame`], the payload structs, [`ClientCommand`]) -
//!   the `{ event, data }` envelope and what travels inside it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) - how frames become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]) - what can go wrong doing that.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else and knows nothing
//! about sockets, authentication, or who is in which room. It only
//! defines shapes:
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → Router (ClientCommand) → Hub
//! ```

mod codec;
mod error;
mod frame;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use frame::{
    event, now_millis, ClientCommand, EntityRef, EntityUpdatePayload, Frame,
    MembershipPayload, PresencePayload, TypingPayload, TypingRequest,
};
pub use types::{ConnectionId, EntityScope, RoomName, UserId};
