//! Bearer access token extractor.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AuthError;
use crate::guard::Requester;
use crate::service::UserDirectory;
use crate::token::{TokenType, TokenVerifier};

// =============================================================================
// Auth State
// =============================================================================

/// State required to resolve requesters.
///
/// Include it in the application state and expose it via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Verifier for access tokens.
    pub verifier: TokenVerifier,

    /// Directory used to load the requester's admin flag.
    pub directory: UserDirectory,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(verifier: TokenVerifier, directory: UserDirectory) -> Self {
        Self {
            verifier,
            directory,
        }
    }
}

// =============================================================================
// Optional Requester Extractor
// =============================================================================

/// The requester behind the request, if any.
///
/// Resolution:
/// 1. No `Authorization: Bearer` header: `None`
/// 2. Token invalid, expired, not an access token, or without `sub`: `None`
/// 3. Subject no longer exists: `None`
/// 4. Otherwise `Some(Requester)` with `admin` taken from the stored profile
///
/// Routes decide what `None` means through [`crate::guard::AccessGuard`].
///
/// # Errors
///
/// Rejects only when loading the subject fails at the storage layer.
pub struct OptionalRequester(pub Option<Requester>);

impl<S> FromRequestParts<S> for OptionalRequester
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        let auth_state = AuthState::from_ref(state);

        let claims = match auth_state.verifier.parse(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
                return Ok(Self(None));
            }
        };

        if claims.token_type != TokenType::AccessToken {
            tracing::debug!(token_type = %claims.token_type, "Ignoring bearer token of wrong type");
            return Ok(Self(None));
        }

        let Some(subject) = claims.sub.filter(|s| !s.is_empty()) else {
            tracing::debug!("Ignoring bearer token without subject");
            return Ok(Self(None));
        };

        match auth_state.directory.find_user(&subject).await? {
            Some(user) => Ok(Self(Some(Requester::new(user.id, user.profile.admin)))),
            None => {
                tracing::debug!(user_id = %subject, "Bearer token subject no longer exists");
                Ok(Self(None))
            }
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
