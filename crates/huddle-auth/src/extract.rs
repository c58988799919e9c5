//! Bearer-token extraction from the connection handshake.
//!
//! Browsers cannot set an `Authorization` header on a WebSocket
//! upgrade, so clients get three ways to present the same token, tried
//! in a fixed order:
//!
//! 1. `Authorization: Bearer <token>` - non-browser clients, tests
//! 2. `Sec-WebSocket-Protocol: bearer.<token>` - browsers
//! 3. `?token=<token>` in the URL query - last resort (URLs end up in
//!    proxy logs, so prefer the subprotocol)
//!
//! Extraction is just locating the token string; verification is the
//! authenticator's job.

use huddle_transport::Handshake;

use crate::AuthError;

/// Finds the bearer token in a handshake, trying the `Authorization`
/// header, then the subprotocol offer, then the query string.
///
/// # Errors
/// Returns [`AuthError::NoCredentials`] when none of the three carries
/// a non-empty token. A present-but-unusable source (wrong scheme,
/// empty value) falls through to the next one rather than failing the
/// whole extraction.
pub fn extract_bearer(handshake: &Handshake) -> Result<&str, AuthError> {
    if let Some(header) = handshake.authorization.as_deref() {
        if let Some(token) = header.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Ok(token);
            }
        }
    }

    // The offer is a comma-separated list; the token entry does not
    // have to be first (clients may offer real subprotocols too).
    if let Some(protocols) = handshake.protocols.as_deref() {
        for entry in protocols.split(',') {
            if let Some(token) = entry.trim().strip_prefix("bearer.") {
                if !token.is_empty() {
                    return Ok(token);
                }
            }
        }
    }

    // JWTs are base64url and dots, so no percent-decoding is needed.
    if let Some(query) = handshake.query.as_deref() {
        for pair in query.split('&') {
            if let Some(token) = pair.strip_prefix("token=") {
                if !token.is_empty() {
                    return Ok(token);
                }
            }
        }
    }

    Err(AuthError::NoCredentials)
}

// =========================================================================
// Tests
// =========================================================================
