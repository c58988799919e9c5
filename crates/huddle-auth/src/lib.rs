//! Connection authentication for Huddle.
//!
//! Two halves, used in sequence during connection setup:
//!
//! - **Extraction** ([`extract_bearer`]) - find the bearer token in
//!   whatever part of the handshake the client managed to put it.
//! - **Verification** ([`Authenticator`] trait, [`JwtAuthenticator`]) -
//!   check it and produce [`Claims`].
//!
//! Both halves fail closed: no token or a bad token means the
//! connection is dropped before it touches any gateway state.

mod authenticator;
mod error;
mod extract;
mod jwt;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use extract::extract_bearer;
pub use jwt::{Claims, JwtAuthenticator};
