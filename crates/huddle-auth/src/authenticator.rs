//! Authentication hook for validating client identity.
//!
//! Huddle ships a JWT verifier ([`JwtAuthenticator`](crate::JwtAuthenticator))
//! because that is what the surrounding platform issues, but the gateway
//! itself only depends on the [`Authenticator`] trait: one async method
//! that takes a bearer token and returns verified [`Claims`](crate::Claims)
//! or an error. Tests plug in a stub; a deployment fronted by a different
//! identity provider plugs in its own verifier. No framework code changes
//! either way.

use crate::{AuthError, Claims};

/// Validates a client's bearer token and returns their verified claims.
///
/// # Trait bounds
///
/// - `Send + Sync` → the authenticator is shared across connection
///   tasks (Tokio may call it from different threads simultaneously).
/// - `'static` → it doesn't borrow temporary data; it lives as long as
///   the server.
///
/// # Example
///
/// ```rust
/// use huddle_auth::{AuthError, Authenticator, Claims};
///
/// /// Accepts a fixed set of tokens. Useful in tests.
/// struct AllowList(Vec<(String, String)>);
///
/// impl Authenticator for AllowList {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<Claims, AuthError> {
///         self.0
///             .iter()
///             .find(|(t, _)| t == token)
///             .map(|(_, user)| Claims::for_subject(user.clone()))
///             .ok_or(AuthError::InvalidSignature)
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token and returns the verified claims.
    ///
    /// Called once per connection, before the connection is registered
    /// anywhere. A returned error means the connection is closed
    /// without ever reaching the hub.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Claims, AuthError>> + Send;
}
