//! Transport abstraction layer for Huddle.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the underlying network protocol, plus the [`Handshake`] data captured
//! while a connection is established. Credentials arrive during the
//! upgrade (header, subprotocol, or query string), so the handshake is
//! part of the transport contract here, not an afterthought.
//!
//! # Feature Flags
//!
//! - `websocket` (default) - WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use huddle_protocol::ConnectionId;

/// Request data captured while accepting a connection.
///
/// Everything a client can use to carry credentials into the upgrade:
/// the `Authorization` header, the offered WebSocket subprotocols, and
/// the raw query string of the request URI. All optional; the auth
/// layer decides what counts.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Value of the `Authorization` header, verbatim.
    pub authorization: Option<String>,

    /// Value of the `Sec-WebSocket-Protocol` header, verbatim
    /// (comma-separated list as sent by the client).
    pub protocols: Option<String>,

    /// Query string of the request URI, without the leading `?`.
    pub query: Option<String>,
}

impl Handshake {
    /// The first entry of the subprotocol offer, trimmed.
    ///
    /// This is the protocol a well-behaved server echoes back in the
    /// upgrade response.
    pub fn first_protocol(&self) -> Option<&str> {
        self.protocols
            .as_deref()
            .and_then(|p| p.split(',').next())
            .map(str::trim)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive messages.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the handshake data captured when this connection was
    /// accepted.
    fn handshake(&self) -> &Handshake;
}
