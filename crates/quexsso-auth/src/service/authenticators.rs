//! Authenticator store: per-user primary authenticators with reverse lookup.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::UserId;
use crate::storage::{AttachOutcome, RemoveOutcome, UserStorage};
use crate::types::{Authenticator, AuthenticatorKey, User};

/// Manages the primary authenticators attached to users.
#[derive(Clone)]
pub struct AuthenticatorStore {
    storage: Arc<dyn UserStorage>,
}

impl AuthenticatorStore {
    /// Creates a store over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn UserStorage>) -> Self {
        Self { storage }
    }

    /// Attaches `authenticator` to the user.
    ///
    /// Attaching an authenticator the user already holds changes nothing.
    ///
    /// # Errors
    ///
    /// - `AuthError::NotFound` if the user does not exist
    /// - `AuthError::Conflict` if another user holds the authenticator
    pub async fn add(&self, user_id: &UserId, authenticator: &Authenticator) -> AuthResult<()> {
        let key = authenticator.key();
        match self
            .storage
            .add_primary_authenticator(user_id, authenticator)
            .await?
        {
            AttachOutcome::Attached => {
                tracing::info!(user_id = %user_id, authenticator = %key, "Primary authenticator attached");
                Ok(())
            }
            AttachOutcome::AlreadyAttached => {
                tracing::debug!(user_id = %user_id, authenticator = %key, "Primary authenticator already attached");
                Ok(())
            }
            AttachOutcome::OwnedByOther(owner) => {
                tracing::warn!(
                    user_id = %user_id,
                    owner = %owner,
                    authenticator = %key,
                    "Authenticator belongs to another user"
                );
                Err(AuthError::conflict(
                    "Authenticator is already attached to another user.",
                ))
            }
            AttachOutcome::UnknownUser => {
                Err(AuthError::not_found(format!("User {user_id} not found.")))
            }
        }
    }

    /// Detaches the authenticator with `key` from the user.
    ///
    /// Removing an authenticator the user does not hold is not an error.
    /// Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` only if the user does not exist.
    pub async fn remove(&self, user_id: &UserId, key: &AuthenticatorKey) -> AuthResult<bool> {
        match self
            .storage
            .remove_primary_authenticator(user_id, key)
            .await?
        {
            RemoveOutcome::Removed => {
                tracing::info!(user_id = %user_id, authenticator = %key, "Primary authenticator removed");
                Ok(true)
            }
            RemoveOutcome::NotPresent => {
                tracing::debug!(user_id = %user_id, authenticator = %key, "Primary authenticator not present");
                Ok(false)
            }
            RemoveOutcome::UnknownUser => {
                Err(AuthError::not_found(format!("User {user_id} not found.")))
            }
        }
    }

    /// Finds the user holding the authenticator `(kind, id)`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no user holds it.
    pub async fn find_by_authenticator(&self, kind: &str, id: &str) -> AuthResult<User> {
        let key = AuthenticatorKey::new(kind, id);
        self.storage
            .find_by_authenticator(&key)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("No user holds authenticator {key}.")))
    }

    /// Lists the user's primary authenticators in attachment order.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the user does not exist.
    pub async fn list(&self, user_id: &UserId) -> AuthResult<Vec<Authenticator>> {
        self.storage
            .find_by_id(user_id)
            .await?
            .map(|user| user.authentication.primary)
            .ok_or_else(|| AuthError::not_found(format!("User {user_id} not found.")))
    }
}
