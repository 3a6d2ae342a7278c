//! User storage trait.
//!
//! Defines the interface for user persistence, including the reverse index
//! from authenticator identity to owning user.

use async_trait::async_trait;

use crate::AuthResult;
use crate::identity::UserId;
use crate::types::{Authenticator, AuthenticatorKey, Profile, ProfilePatch, User};

/// Result of attaching an authenticator to a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The authenticator was appended to the user's primary list.
    Attached,
    /// The user already held an authenticator with the same key; nothing changed.
    AlreadyAttached,
    /// Another user owns the authenticator; nothing changed.
    OwnedByOther(UserId),
    /// No user with the given id exists.
    UnknownUser,
}

/// Result of detaching an authenticator from a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The authenticator was removed.
    Removed,
    /// The user did not hold the authenticator; nothing changed.
    NotPresent,
    /// No user with the given id exists.
    UnknownUser,
}

/// Storage trait for user records.
///
/// Implementations must keep two invariants:
///
/// - a user's `authentication.primary` never holds two entries with the same
///   [`AuthenticatorKey`]
/// - an authenticator key is held by at most one user
///
/// `add_primary_authenticator` and `remove_primary_authenticator` must be
/// atomic with respect to concurrent updates of the same user.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Inserts a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if a user with the same id exists.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<User>>;

    /// Lists all users ordered by creation time.
    async fn list(&self) -> AuthResult<Vec<User>>;

    /// Deletes a user, returning `true` if one was removed.
    ///
    /// Releases every authenticator the user held.
    async fn delete(&self, id: &UserId) -> AuthResult<bool>;

    /// Applies a profile patch, returning the updated profile or `None` for
    /// an unknown user.
    async fn patch_profile(&self, id: &UserId, patch: &ProfilePatch)
    -> AuthResult<Option<Profile>>;

    /// Appends an authenticator to the user's primary list.
    async fn add_primary_authenticator(
        &self,
        id: &UserId,
        authenticator: &Authenticator,
    ) -> AuthResult<AttachOutcome>;

    /// Removes the authenticator with the given key from the user's primary list.
    async fn remove_primary_authenticator(
        &self,
        id: &UserId,
        key: &AuthenticatorKey,
    ) -> AuthResult<RemoveOutcome>;

    /// Finds the user holding the authenticator with the given key.
    async fn find_by_authenticator(&self, key: &AuthenticatorKey) -> AuthResult<Option<User>>;
}
