//! Bearer token verification.
//!
//! [`TokenVerifier::validate`] answers whether a token is structurally sound,
//! correctly signed, issued by the configured issuer and not expired. It never
//! fails. [`TokenVerifier::parse`] decodes the claims and maps every failure to
//! [`AuthError::InvalidToken`]. Callers check the token type only after
//! `validate` succeeds.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;

use super::jwt::{JwtService, TokenClaims};

/// Stateless verifier over a shared [`JwtService`].
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    jwt: Arc<JwtService>,
}

impl TokenVerifier {
    /// Creates a verifier using the given JWT service as trust anchor.
    #[must_use]
    pub fn new(jwt: Arc<JwtService>) -> Self {
        Self { jwt }
    }

    /// Returns `true` if the token's signature, issuer and expiry check out.
    ///
    /// Only the envelope is checked here; claim shape is left to [`Self::parse`].
    #[must_use]
    pub fn validate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match self.jwt.decode::<serde_json::Value>(token) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Token failed validation");
                false
            }
        }
    }

    /// Decodes the token claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token cannot be decoded into
    /// [`TokenClaims`].
    pub fn parse(&self, token: &str) -> AuthResult<TokenClaims> {
        self.jwt
            .decode::<TokenClaims>(token)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Failed to parse token claims");
                AuthError::invalid_token(e.to_string())
            })
    }

    /// Returns the underlying JWT service.
    #[must_use]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::identity::UserId;
    use crate::token::jwt::{SigningKey, TokenType};
    use crate::types::Authenticator;

    const ISSUER: &str = "https://sso.example.com";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(Arc::new(JwtService::new(
            SigningKey::hmac(b"verifier-secret-verifier-secret-xx"),
            ISSUER,
        )))
    }

    #[test]
    fn test_validate_accepts_good_token() {
        let verifier = verifier();
        let claims = TokenClaims::primary_auth(
            ISSUER,
            Authenticator::new("google", "g-1"),
            "google",
            Duration::from_secs(60),
        );
        let token = verifier.jwt().encode(&claims).unwrap();

        assert!(verifier.validate(&token));
        let parsed = verifier.parse(&token).unwrap();
        assert_eq!(parsed.token_type, TokenType::PrimaryAuthToken);
        assert_eq!(parsed.strategy.as_deref(), Some("google"));
    }

    #[test]
    fn test_validate_never_panics_on_garbage() {
        let verifier = verifier();
        assert!(!verifier.validate(""));
        assert!(!verifier.validate("abc"));
        assert!(!verifier.validate("a.b.c"));
    }

    #[test]
    fn test_validate_rejects_expired() {
        let verifier = verifier();
        let claims = TokenClaims::access(ISSUER, UserId::new("1"), Duration::from_secs(60))
            .expires_in_seconds(-600);
        let token = verifier.jwt().encode(&claims).unwrap();
        assert!(!verifier.validate(&token));
    }

    #[test]
    fn test_parse_maps_to_invalid_token() {
        let verifier = verifier();
        let err = verifier.parse("not-a-token").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_valid_envelope_with_bad_claims_fails_parse() {
        let verifier = verifier();
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let token = verifier
            .jwt()
            .encode(&serde_json::json!({
                "iss": ISSUER,
                "exp": now + 60,
                "iat": "yesterday",
            }))
            .unwrap();

        assert!(verifier.validate(&token));
        assert!(verifier.parse(&token).is_err());
    }
}
