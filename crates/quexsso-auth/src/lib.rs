//! # quexsso-auth
//!
//! Identity, authorization and audit core for the Quexten SSO user service.
//!
//! This crate provides:
//! - User, profile and primary authenticator types with a canonical [`UserId`]
//! - Verification of access tokens and single-use primary auth tokens
//! - An explicit authorization guard for owner/admin checks
//! - Service objects over pluggable storage traits
//! - The new-user provisioning flow
//! - Axum extractors and error responses
//!
//! ## Modules
//!
//! - [`config`] - Token signing and primary token configuration
//! - [`token`] - JWT encoding/decoding and the validate/parse verifier
//! - [`guard`] - Authorization decisions
//! - [`service`] - User directory, authenticator store, profiles, audit sink
//! - [`provisioning`] - Token-to-user provisioning flow
//! - [`middleware`] - Axum extractors and `IntoResponse` for [`AuthError`]
//! - [`storage`] - Storage traits implemented by backend crates

pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod middleware;
pub mod provisioning;
pub mod service;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, ConfigError, PrimaryTokenConfig, SigningConfig};
pub use error::{AuthError, ErrorCategory};
pub use guard::{AccessGuard, ReadView, Relation, Requester};
pub use identity::UserId;
pub use middleware::{AuthState, OptionalRequester, RequestOrigin};
pub use provisioning::{PrimaryAuthGrant, ProvisioningFlow, ProvisioningStage};
pub use service::{AuditSink, AuthenticatorStore, ProfileService, UserDirectory};
pub use storage::{AttachOutcome, AuditStorage, RemoveOutcome, TokenLedger, UserStorage};
pub use token::{JwtError, JwtService, SigningAlgorithm, SigningKey, TokenClaims, TokenType, TokenVerifier};
pub use types::{
    AuditEvent, AuditOrigin, Authentication, Authenticator, AuthenticatorKey, Profile,
    ProfilePatch, User, UserView, event_types,
};

/// Type alias for results of this crate's operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use quexsso_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::guard::{AccessGuard, ReadView, Relation, Requester};
    pub use crate::identity::UserId;
    pub use crate::middleware::{AuthState, OptionalRequester, RequestOrigin};
    pub use crate::service::{AuditSink, AuthenticatorStore, ProfileService, UserDirectory};
    pub use crate::storage::{AuditStorage, TokenLedger, UserStorage};
    pub use crate::types::{AuditOrigin, Authenticator, AuthenticatorKey, User, UserView};
}
