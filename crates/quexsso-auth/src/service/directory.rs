//! User directory: create, read, list and delete user records.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::UserId;
use crate::storage::UserStorage;
use crate::types::{ProfilePatch, User};

/// Root aggregate for user records.
#[derive(Clone)]
pub struct UserDirectory {
    storage: Arc<dyn UserStorage>,
}

impl UserDirectory {
    /// Creates a directory over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn UserStorage>) -> Self {
        Self { storage }
    }

    /// Returns every user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list_users(&self) -> AuthResult<Vec<User>> {
        self.storage.list().await
    }

    /// Returns the user with the given id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no such user exists.
    pub async fn get_user(&self, id: &UserId) -> AuthResult<User> {
        self.storage
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("User {id} not found.")))
    }

    /// Returns the user with the given id, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn find_user(&self, id: &UserId) -> AuthResult<Option<User>> {
        self.storage.find_by_id(id).await
    }

    /// Allocates a new empty user with no authenticators attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn create_user(&self) -> AuthResult<User> {
        let user = User::new();
        self.storage.create(&user).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Deletes a user.
    ///
    /// Authenticators held by the user are released; audit history is kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no such user exists.
    pub async fn delete_user(&self, id: &UserId) -> AuthResult<()> {
        if self.storage.delete(id).await? {
            tracing::info!(user_id = %id, "User deleted");
            Ok(())
        } else {
            Err(AuthError::not_found(format!("User {id} not found.")))
        }
    }

    /// Makes sure a user with `id` exists and carries the admin flag.
    ///
    /// Returns `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn ensure_admin(&self, id: &UserId) -> AuthResult<bool> {
        match self.storage.find_by_id(id).await? {
            Some(user) if user.is_admin() => Ok(false),
            Some(_) => {
                self.storage
                    .patch_profile(id, &ProfilePatch::admin(true))
                    .await?;
                Ok(true)
            }
            None => {
                let mut user = User::with_id(id.clone());
                user.profile.admin = true;
                match self.storage.create(&user).await {
                    Ok(()) => Ok(true),
                    // Lost a race with a concurrent bootstrap.
                    Err(AuthError::Conflict { .. }) => Ok(false),
                    Err(e) => Err(e),
                }
            }
        }
    }
}
