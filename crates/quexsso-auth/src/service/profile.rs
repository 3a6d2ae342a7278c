//! Profile reads and updates.

use std::sync::Arc;

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::UserId;
use crate::storage::UserStorage;
use crate::types::{Profile, ProfilePatch};

/// Reads and patches user profiles.
#[derive(Clone)]
pub struct ProfileService {
    storage: Arc<dyn UserStorage>,
}

impl ProfileService {
    /// Creates a profile service over the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn UserStorage>) -> Self {
        Self { storage }
    }

    /// Returns the user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the user does not exist.
    pub async fn get_profile(&self, user_id: &UserId) -> AuthResult<Profile> {
        self.storage
            .find_by_id(user_id)
            .await?
            .map(|user| user.profile)
            .ok_or_else(|| AuthError::not_found(format!("User {user_id} not found.")))
    }

    /// Replaces the user's avatar.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the user does not exist.
    pub async fn update_avatar(&self, user_id: &UserId, avatar: &str) -> AuthResult<Profile> {
        self.patch(user_id, &ProfilePatch::avatar(avatar)).await
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if the user does not exist.
    pub async fn patch(&self, user_id: &UserId, patch: &ProfilePatch) -> AuthResult<Profile> {
        let profile = self
            .storage
            .patch_profile(user_id, patch)
            .await?
            .ok_or_else(|| AuthError::not_found(format!("User {user_id} not found.")))?;
        tracing::debug!(user_id = %user_id, "Profile updated");
        Ok(profile)
    }
}
