//! New-user provisioning from a primary auth token.
//!
//! The flow advances strictly in order and stops at the first failure:
//!
//! ```text
//! TokenReceived -> TokenValidated -> TypeChecked -> UserCreated
//!     -> AuthenticatorAttached -> AvatarUpdated -> Done
//! ```
//!
//! Steps after `TypeChecked` are independent writes. A failure part way
//! through leaves the earlier writes in place (for example a user without
//! an authenticator); nothing is rolled back.
//!
//! A successful run emits exactly two audit events, in order:
//! `com.quexten.sso.createUser` then `com.quexten.sso.addPrimaryAuthenticator`.

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::UserId;
use crate::service::{AuditSink, AuthenticatorStore, ProfileService, UserDirectory};
use crate::storage::TokenLedger;
use crate::token::{TokenClaims, TokenType, TokenVerifier};
use crate::types::{AuditOrigin, Authenticator, User, event_types};

/// Message for tokens that fail validation or carry no authenticator.
pub const INVALID_TOKEN_MESSAGE: &str = "Supplied authentication token is invalid.";
/// Message for tokens of a type other than `primaryAuthToken`.
pub const WRONG_TYPE_MESSAGE: &str = "Supplied token has incorrect type.";
/// Message for primary auth tokens presented a second time.
pub const REUSED_TOKEN_MESSAGE: &str = "Supplied authentication token has already been used.";

/// Steps of the provisioning flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStage {
    /// Token received, nothing checked yet.
    TokenReceived,
    /// Signature, issuer and expiry verified.
    TokenValidated,
    /// Token type is `primaryAuthToken`.
    TypeChecked,
    /// Empty user record created.
    UserCreated,
    /// Primary authenticator attached.
    AuthenticatorAttached,
    /// Avatar copied from the authenticator.
    AvatarUpdated,
    /// Finished.
    Done,
}

impl fmt::Display for ProvisioningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenReceived => "token_received",
            Self::TokenValidated => "token_validated",
            Self::TypeChecked => "type_checked",
            Self::UserCreated => "user_created",
            Self::AuthenticatorAttached => "authenticator_attached",
            Self::AvatarUpdated => "avatar_updated",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// An accepted primary auth token.
#[derive(Debug, Clone)]
pub struct PrimaryAuthGrant {
    /// Authenticator to attach, with `kind` filled from the strategy if the token omitted it.
    pub authenticator: Authenticator,
    /// Strategy that issued the token.
    pub strategy: Option<String>,
}

/// Orchestrates user provisioning and authenticator attachment from primary auth tokens.
#[derive(Clone)]
pub struct ProvisioningFlow {
    verifier: TokenVerifier,
    directory: UserDirectory,
    authenticators: AuthenticatorStore,
    profiles: ProfileService,
    audit: AuditSink,
    ledger: Arc<dyn TokenLedger>,
    single_use: bool,
}

impl ProvisioningFlow {
    /// Creates a flow. Single use of primary tokens is enforced by default.
    #[must_use]
    pub fn new(
        verifier: TokenVerifier,
        directory: UserDirectory,
        authenticators: AuthenticatorStore,
        profiles: ProfileService,
        audit: AuditSink,
        ledger: Arc<dyn TokenLedger>,
    ) -> Self {
        Self {
            verifier,
            directory,
            authenticators,
            profiles,
            audit,
            ledger,
            single_use: true,
        }
    }

    /// Enables or disables single-use enforcement.
    #[must_use]
    pub fn with_single_use(mut self, single_use: bool) -> Self {
        self.single_use = single_use;
        self
    }

    /// Creates a new user from a primary auth token.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidToken` if the token fails validation, carries no
    ///   authenticator, or was already used
    /// - `AuthError::WrongTokenType` if the token is not a primary auth token
    /// - `AuthError::Conflict` if another user already holds the authenticator
    ///   (the new user is kept)
    /// - any storage error from the individual steps
    pub async fn provision(&self, token: &str, origin: &AuditOrigin) -> AuthResult<User> {
        let grant = self.accept_primary_token(token).await?;

        let user = self.directory.create_user().await?;
        log_stage(ProvisioningStage::UserCreated, Some(&user.id));
        self.audit
            .push_event(
                &user.id,
                json!({ "userId": user.id }),
                event_types::CREATE_USER,
                origin,
            )
            .await?;

        self.attach(&user.id, &grant, origin).await?;

        if let Some(avatar) = grant.authenticator.avatar.as_deref() {
            self.profiles.update_avatar(&user.id, avatar).await?;
            log_stage(ProvisioningStage::AvatarUpdated, Some(&user.id));
        }

        let user = self.directory.get_user(&user.id).await?;
        log_stage(ProvisioningStage::Done, Some(&user.id));
        Ok(user)
    }

    /// Attaches the authenticator carried by a primary auth token to an existing user.
    ///
    /// # Errors
    ///
    /// Same token errors as [`Self::provision`], plus `AuthError::NotFound`
    /// for an unknown user.
    pub async fn attach_from_token(
        &self,
        user_id: &UserId,
        token: &str,
        origin: &AuditOrigin,
    ) -> AuthResult<User> {
        let grant = self.accept_primary_token(token).await?;
        self.attach(user_id, &grant, origin).await?;
        self.directory.get_user(user_id).await
    }

    /// Runs the token checks, in order: validity, type, payload, single use.
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidToken` or `AuthError::WrongTokenType`.
    pub async fn accept_primary_token(&self, token: &str) -> AuthResult<PrimaryAuthGrant> {
        log_stage(ProvisioningStage::TokenReceived, None);

        if !self.verifier.validate(token) {
            return Err(AuthError::invalid_token(INVALID_TOKEN_MESSAGE));
        }
        let claims = self
            .verifier
            .parse(token)
            .map_err(|_| AuthError::invalid_token(INVALID_TOKEN_MESSAGE))?;
        log_stage(ProvisioningStage::TokenValidated, None);

        if claims.token_type != TokenType::PrimaryAuthToken {
            tracing::debug!(token_type = %claims.token_type, "Rejected token of wrong type");
            return Err(AuthError::wrong_token_type(WRONG_TYPE_MESSAGE));
        }
        log_stage(ProvisioningStage::TypeChecked, None);

        let grant = grant_from_claims(&claims)?;

        if self.single_use {
            self.consume(&claims).await?;
        }

        Ok(grant)
    }

    async fn consume(&self, claims: &TokenClaims) -> AuthResult<()> {
        let Some(jti) = claims.jti.as_deref() else {
            tracing::debug!("Primary auth token without jti");
            return Err(AuthError::invalid_token(INVALID_TOKEN_MESSAGE));
        };
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|_| AuthError::invalid_token(INVALID_TOKEN_MESSAGE))?;

        if self.ledger.consume(jti, expires_at).await? {
            Ok(())
        } else {
            tracing::warn!(jti = %jti, "Primary auth token replayed");
            Err(AuthError::invalid_token(REUSED_TOKEN_MESSAGE))
        }
    }

    async fn attach(
        &self,
        user_id: &UserId,
        grant: &PrimaryAuthGrant,
        origin: &AuditOrigin,
    ) -> AuthResult<()> {
        self.authenticators.add(user_id, &grant.authenticator).await?;
        log_stage(ProvisioningStage::AuthenticatorAttached, Some(user_id));
        self.audit
            .push_event(
                user_id,
                json!({
                    "authenticatorId": grant.authenticator.id,
                    "authenticatorType": grant.strategy,
                }),
                event_types::ADD_PRIMARY_AUTHENTICATOR,
                origin,
            )
            .await?;
        Ok(())
    }
}

fn grant_from_claims(claims: &TokenClaims) -> AuthResult<PrimaryAuthGrant> {
    let Some(mut authenticator) = claims.primary_authenticator.clone() else {
        tracing::debug!("Primary auth token without authenticator");
        return Err(AuthError::invalid_token(INVALID_TOKEN_MESSAGE));
    };
    if authenticator.id.is_empty() {
        return Err(AuthError::invalid_token(INVALID_TOKEN_MESSAGE));
    }
    if authenticator.kind.is_empty() {
        match claims.strategy.as_deref() {
            Some(strategy) if !strategy.is_empty() => authenticator.kind = strategy.to_string(),
            _ => return Err(AuthError::invalid_token(INVALID_TOKEN_MESSAGE)),
        }
    }
    Ok(PrimaryAuthGrant {
        authenticator,
        strategy: claims.strategy.clone(),
    })
}

fn log_stage(stage: ProvisioningStage, user_id: Option<&UserId>) {
    match user_id {
        Some(id) => tracing::info!(stage = %stage, user_id = %id, "Provisioning step completed"),
        None => tracing::debug!(stage = %stage, "Provisioning step completed"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn claims() -> TokenClaims {
        TokenClaims::primary_auth(
            "iss",
            Authenticator::new("", "g-1"),
            "google",
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_kind_filled_from_strategy() {
        let grant = grant_from_claims(&claims()).unwrap();
        assert_eq!(grant.authenticator.kind, "google");
        assert_eq!(grant.strategy.as_deref(), Some("google"));
    }

    #[test]
    fn test_explicit_kind_kept() {
        let mut claims = claims();
        claims.primary_authenticator = Some(Authenticator::new("oidc", "g-1"));
        let grant = grant_from_claims(&claims).unwrap();
        assert_eq!(grant.authenticator.kind, "oidc");
    }

    #[test]
    fn test_missing_authenticator_rejected() {
        let mut claims = claims();
        claims.primary_authenticator = None;
        assert!(matches!(
            grant_from_claims(&claims),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_missing_kind_and_strategy_rejected() {
        let mut claims = claims();
        claims.strategy = None;
        assert!(grant_from_claims(&claims).is_err());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(ProvisioningStage::TypeChecked.to_string(), "type_checked");
        assert_eq!(ProvisioningStage::Done.to_string(), "done");
    }
}
