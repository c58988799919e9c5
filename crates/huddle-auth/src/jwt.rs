//! JWT verification for connection authentication.
//!
//! Tokens are minted by the REST layer at login and verified here with
//! a shared HS256 secret. The algorithm is pinned: a token whose header
//! names anything else fails verification no matter what it is signed
//! with, which closes the classic `alg`-swap hole. Expiry is required,
//! not optional; a token without `exp` never verifies.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use huddle_protocol::UserId;

use crate::{AuthError, Authenticator};

/// Claims carried by a Huddle access token.
///
/// `sub` is the user id the rest of the gateway keys everything on.
/// `roles` pass through for consumers that care; the gateway itself
/// grants nothing based on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier (the `userId` clients see in presence events).
    pub sub: String,

    /// Role names, verbatim from the token.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiry, Unix seconds. Mandatory: tokens without it are rejected.
    pub exp: u64,

    /// Issued-at, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// Issuer, checked only when the verifier pins one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Minimal claims for a subject, expiring far in the future.
    ///
    /// Meant for stub authenticators in tests and examples; production
    /// claims come out of [`JwtAuthenticator`], never from here.
    pub fn for_subject(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            roles: Vec::new(),
            exp: u64::MAX / 2,
            iat: None,
            iss: None,
        }
    }

    /// The subject as a typed user id.
    pub fn user_id(&self) -> UserId {
        UserId::new(&self.sub)
    }
}

/// Verifies HS256-signed bearer tokens against a shared secret.
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    /// Creates a verifier for the given shared secret.
    ///
    /// `exp` is validated (and required) by default.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Additionally requires the token's `iss` to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.validation.set_issuer(&[issuer.into()]);
        self
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| {
                tracing::debug!(sub = %data.claims.sub, "token verified");
                data.claims
            })
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::ExpiredToken
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidSignature
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidIssuer
                }
                _ => AuthError::ValidationFailed(e.to_string()),
            })
    }
}

impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Verification tests mint real tokens with `jsonwebtoken::encode`
    //! and check each rejection path maps to the right error.

    use super::*;

    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn mint(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn valid_claims() -> Claims {
        Claims {
            sub: "u-1".into(),
            roles: vec!["member".into()],
            exp: now_secs() + 3600,
            iat: Some(now_secs()),
            iss: None,
        }
    }

    // =====================================================================
    // Happy path
    // =====================================================================

    #[tokio::test]
    async fn test_authenticate_valid_token_returns_claims() {
        let auth = JwtAuthenticator::new(SECRET);
        let token = mint(&valid_claims(), SECRET);

        let claims = auth.authenticate(&token).await.unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.roles, vec!["member".to_string()]);
        assert_eq!(claims.user_id(), UserId::new("u-1"));
    }

    #[tokio::test]
    async fn test_authenticate_with_matching_issuer_succeeds() {
        let auth = JwtAuthenticator::new(SECRET).with_issuer("huddle-api");
        let mut claims = valid_claims();
        claims.iss = Some("huddle-api".into());

        let result = auth.authenticate(&mint(&claims, SECRET)).await;
        assert!(result.is_ok());
    }

    // =====================================================================
    // Rejection paths
    // =====================================================================

    #[tokio::test]
    async fn test_authenticate_expired_token_fails() {
        let auth = JwtAuthenticator::new(SECRET);
        let mut claims = valid_claims();
        claims.exp = now_secs() - 3600;

        let err = auth.authenticate(&mint(&claims, SECRET)).await.unwrap_err();
        assert_eq!(err, AuthError::ExpiredToken);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_secret_fails() {
        let auth = JwtAuthenticator::new("other-secret");
        let token = mint(&valid_claims(), SECRET);

        let err = auth.authenticate(&token).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_issuer_fails() {
        let auth = JwtAuthenticator::new(SECRET).with_issuer("huddle-api");
        let mut claims = valid_claims();
        claims.iss = Some("someone-else".into());

        let err = auth.authenticate(&mint(&claims, SECRET)).await.unwrap_err();
        assert_eq!(err, AuthError::InvalidIssuer);
    }

    #[tokio::test]
    async fn test_authenticate_garbage_token_fails() {
        let auth = JwtAuthenticator::new(SECRET);

        let err = auth.authenticate("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_authenticate_token_without_exp_fails() {
        // Minted from a serde_json map because Claims itself cannot
        // express a missing exp.
        let auth = JwtAuthenticator::new(SECRET);
        let claims = serde_json::json!({ "sub": "u-1" });
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(auth.authenticate(&token).await.is_err());
    }

    // =====================================================================
    // Claims helpers
    // =====================================================================

    #[test]
    fn test_for_subject_builds_unexpired_claims() {
        let claims = Claims::for_subject("u-9");
        assert_eq!(claims.sub, "u-9");
        assert!(claims.exp > now_secs());
        assert!(claims.roles.is_empty());
    }
}
