//! Error types for the auth layer.

/// Errors that can occur while extracting or verifying credentials.
///
/// Every variant means the same thing to the connection lifecycle: the
/// client never becomes Active and the socket is closed. The variants
/// exist for logging; clients are told nothing beyond the close.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No usable bearer token anywhere in the handshake.
    #[error("no bearer credentials in handshake")]
    NoCredentials,

    /// The token's `exp` is in the past.
    #[error("token expired")]
    ExpiredToken,

    /// The signature does not verify against the shared secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The `iss` claim does not match the expected issuer.
    #[error("invalid token issuer")]
    InvalidIssuer,

    /// Anything else: malformed token, wrong algorithm, missing
    /// required claims.
    #[error("token validation failed: {0}")]
    ValidationFailed(String),
}
