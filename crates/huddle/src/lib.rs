//! Huddle: a real-time collaboration gateway over WebSockets.
//!
//! Huddle owns every open client connection for an application whose
//! HTTP side stays stateless. It verifies a bearer token during the
//! WebSocket handshake, tracks which users are online and which
//! project/task rooms each connection is watching, and fans out
//! presence, membership, typing, and entity-update events to the
//! right sockets.
//!
//! # Architecture
//!
//! ```text
//! WebSocket client
//!       │
//!       ▼
//! transport        accept + handshake capture      (huddle-transport)
//!       │
//!       ▼
//! handler          auth → register → relay loop    (one task per conn)
//!       │
//!       ▼
//! hub              presence, rooms, fan-out        (one actor task)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use huddle::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GatewayError> {
//!     let server = HuddleServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build(JwtAuthenticator::new(b"secret"))
//!         .await?;
//!
//!     // Hand this to the REST layer; it pushes entity updates and
//!     // notifications through it after writes commit.
//!     let _hub = server.hub();
//!
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod router;
mod server;
mod state;

pub use error::GatewayError;
pub use router::EventRouter;
pub use server::{HuddleServer, HuddleServerBuilder};
pub use state::ConnPhase;

/// Commonly used types, re-exported in one place.
pub mod prelude {
    pub use huddle_auth::{AuthError, Authenticator, Claims, JwtAuthenticator};
    pub use huddle_hub::{FrameSender, HubError, HubHandle};
    pub use huddle_protocol::{
        event, now_millis, ClientCommand, Codec, ConnectionId, EntityScope, EntityUpdatePayload,
        Frame, JsonCodec, MembershipPayload, PresencePayload, ProtocolError, RoomName,
        TypingPayload, UserId,
    };
    pub use huddle_transport::{
        Connection, Handshake, Transport, TransportError, WebSocketTransport,
    };

    pub use crate::{ConnPhase, EventRouter, GatewayError, HuddleServer, HuddleServerBuilder};
}
