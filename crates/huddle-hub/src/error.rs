//! Error types for the hub crate.

use huddle_protocol::ConnectionId;
use thiserror::Error;

/// Errors returned by hub operations.
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub task has stopped and its command channel is closed.
    #[error("hub is unavailable")]
    Unavailable,

    /// The operation named a connection the hub has never registered
    /// (or has already unregistered).
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}
