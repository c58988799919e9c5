//! Unified error type for the Huddle gateway.

use huddle_auth::AuthError;
use huddle_hub::HubError;
use huddle_protocol::ProtocolError;
use huddle_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `huddle` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From`
/// impls, so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid frame).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An authentication failure (missing, expired, or bad token).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A hub-level error (unavailable, unknown connection).
    #[error(transparent)]
    Hub(#[from] HubError),
}
