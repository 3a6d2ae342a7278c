//! In-memory user storage with a reverse authenticator index.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use quexsso_auth::AuthResult;
use quexsso_auth::error::AuthError;
use quexsso_auth::identity::UserId;
use quexsso_auth::storage::{AttachOutcome, RemoveOutcome, UserStorage};
use quexsso_auth::types::{Authenticator, AuthenticatorKey, Profile, ProfilePatch, User};

/// User storage backed by two concurrent maps.
///
/// Lock order is always `index` before `users`. Operations that touch both
/// maps hold the index entry for the authenticator key while updating the
/// user, which makes attach and detach atomic per key and per user.
#[derive(Debug, Default)]
pub struct MemoryUserStorage {
    users: DashMap<UserId, User>,
    index: DashMap<AuthenticatorKey, UserId>,
}

impl MemoryUserStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if no users are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn push_authenticator(&self, id: &UserId, authenticator: &Authenticator) -> AttachOutcome {
        match self.users.get_mut(id) {
            Some(mut user) => {
                if user.has_authenticator(&authenticator.key()) {
                    AttachOutcome::AlreadyAttached
                } else {
                    user.authentication.primary.push(authenticator.clone());
                    AttachOutcome::Attached
                }
            }
            None => AttachOutcome::UnknownUser,
        }
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn create(&self, user: &User) -> AuthResult<()> {
        for authenticator in &user.authentication.primary {
            if let Some(owner) = self.index.get(&authenticator.key()) {
                if *owner != user.id {
                    return Err(AuthError::conflict(format!(
                        "Authenticator {} is already attached to another user.",
                        authenticator.key()
                    )));
                }
            }
        }

        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => {
                return Err(AuthError::conflict(format!(
                    "User {} already exists.",
                    user.id
                )));
            }
            Entry::Vacant(entry) => {
                entry.insert(user.clone());
            }
        }

        for authenticator in &user.authentication.primary {
            self.index
                .entry(authenticator.key())
                .or_insert_with(|| user.id.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    async fn list(&self) -> AuthResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(users)
    }

    async fn delete(&self, id: &UserId) -> AuthResult<bool> {
        let Some((_, user)) = self.users.remove(id) else {
            return Ok(false);
        };
        for authenticator in &user.authentication.primary {
            self.index
                .remove_if(&authenticator.key(), |_, owner| owner == id);
        }
        tracing::debug!(
            user_id = %id,
            released = user.authentication.primary.len(),
            "Released authenticators of deleted user"
        );
        Ok(true)
    }

    async fn patch_profile(
        &self,
        id: &UserId,
        patch: &ProfilePatch,
    ) -> AuthResult<Option<Profile>> {
        Ok(self.users.get_mut(id).map(|mut user| {
            patch.apply(&mut user.profile);
            user.profile.clone()
        }))
    }

    async fn add_primary_authenticator(
        &self,
        id: &UserId,
        authenticator: &Authenticator,
    ) -> AuthResult<AttachOutcome> {
        match self.index.entry(authenticator.key()) {
            Entry::Occupied(mut entry) => {
                let owner = entry.get().clone();
                if &owner == id {
                    return Ok(self.push_authenticator(id, authenticator));
                }
                if self.users.contains_key(&owner) {
                    return Ok(AttachOutcome::OwnedByOther(owner));
                }
                // Stale entry left by a delete that has not finished releasing keys.
                let outcome = self.push_authenticator(id, authenticator);
                if outcome == AttachOutcome::Attached {
                    entry.insert(id.clone());
                }
                Ok(outcome)
            }
            Entry::Vacant(entry) => {
                let outcome = self.push_authenticator(id, authenticator);
                if outcome == AttachOutcome::Attached {
                    entry.insert(id.clone());
                }
                Ok(outcome)
            }
        }
    }

    async fn remove_primary_authenticator(
        &self,
        id: &UserId,
        key: &AuthenticatorKey,
    ) -> AuthResult<RemoveOutcome> {
        match self.index.entry(key.clone()) {
            Entry::Occupied(entry) if entry.get() == id => {
                let Some(mut user) = self.users.get_mut(id) else {
                    entry.remove();
                    return Ok(RemoveOutcome::UnknownUser);
                };
                let before = user.authentication.primary.len();
                user.authentication.primary.retain(|a| &a.key() != key);
                let removed = user.authentication.primary.len() != before;
                drop(user);
                entry.remove();
                Ok(if removed {
                    RemoveOutcome::Removed
                } else {
                    RemoveOutcome::NotPresent
                })
            }
            _ => {
                if self.users.contains_key(id) {
                    Ok(RemoveOutcome::NotPresent)
                } else {
                    Ok(RemoveOutcome::UnknownUser)
                }
            }
        }
    }

    async fn find_by_authenticator(&self, key: &AuthenticatorKey) -> AuthResult<Option<User>> {
        let Some(owner) = self.index.get(key).map(|owner| owner.clone()) else {
            return Ok(None);
        };
        Ok(self
            .users
            .get(&owner)
            .filter(|user| user.has_authenticator(key))
            .map(|user| user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user(id: &str) -> MemoryUserStorage {
        let store = MemoryUserStorage::new();
        store.create(&User::with_id(UserId::new(id))).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = store_with_user("1").await;
        let user = store.find_by_id(&UserId::new("0001")).await.unwrap();
        assert!(user.is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_conflicts() {
        let store = store_with_user("1").await;
        let err = store
            .create(&User::with_id(UserId::new("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_add_is_deduplicated() {
        let store = store_with_user("1").await;
        let id = UserId::new("1");
        let google = Authenticator::new("google", "g-1");

        assert_eq!(
            store.add_primary_authenticator(&id, &google).await.unwrap(),
            AttachOutcome::Attached
        );
        assert_eq!(
            store
                .add_primary_authenticator(&id, &google.clone().with_avatar("http://a"))
                .await
                .unwrap(),
            AttachOutcome::AlreadyAttached
        );

        let user = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(user.authentication.primary.len(), 1);
    }

    #[tokio::test]
    async fn test_add_owned_by_other() {
        let store = store_with_user("1").await;
        store.create(&User::with_id(UserId::new("2"))).await.unwrap();
        let google = Authenticator::new("google", "g-1");

        store
            .add_primary_authenticator(&UserId::new("1"), &google)
            .await
            .unwrap();
        assert_eq!(
            store
                .add_primary_authenticator(&UserId::new("2"), &google)
                .await
                .unwrap(),
            AttachOutcome::OwnedByOther(UserId::new("1"))
        );
    }

    #[tokio::test]
    async fn test_add_to_unknown_user() {
        let store = MemoryUserStorage::new();
        let outcome = store
            .add_primary_authenticator(&UserId::new("9"), &Authenticator::new("google", "g-1"))
            .await
            .unwrap();
        assert_eq!(outcome, AttachOutcome::UnknownUser);
        assert!(
            store
                .find_by_authenticator(&AuthenticatorKey::new("google", "g-1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = store_with_user("1").await;
        let id = UserId::new("1");
        let key = AuthenticatorKey::new("google", "g-1");
        store
            .add_primary_authenticator(&id, &Authenticator::new("google", "g-1"))
            .await
            .unwrap();

        assert_eq!(
            store.remove_primary_authenticator(&id, &key).await.unwrap(),
            RemoveOutcome::Removed
        );
        assert_eq!(
            store.remove_primary_authenticator(&id, &key).await.unwrap(),
            RemoveOutcome::NotPresent
        );
        assert_eq!(
            store
                .remove_primary_authenticator(&UserId::new("2"), &key)
                .await
                .unwrap(),
            RemoveOutcome::UnknownUser
        );
        assert!(store.find_by_authenticator(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_releases_authenticators() {
        let store = store_with_user("1").await;
        store.create(&User::with_id(UserId::new("2"))).await.unwrap();
        let google = Authenticator::new("google", "g-1");
        store
            .add_primary_authenticator(&UserId::new("1"), &google)
            .await
            .unwrap();

        assert!(store.delete(&UserId::new("1")).await.unwrap());
        assert!(!store.delete(&UserId::new("1")).await.unwrap());

        assert_eq!(
            store
                .add_primary_authenticator(&UserId::new("2"), &google)
                .await
                .unwrap(),
            AttachOutcome::Attached
        );
    }

    #[tokio::test]
    async fn test_patch_profile() {
        let store = store_with_user("1").await;
        let profile = store
            .patch_profile(&UserId::new("1"), &ProfilePatch::avatar("http://a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.avatar.as_deref(), Some("http://a"));
        assert!(
            store
                .patch_profile(&UserId::new("2"), &ProfilePatch::admin(true))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_concurrent_attach_has_single_owner() {
        let store = std::sync::Arc::new(MemoryUserStorage::new());
        for i in 0..16 {
            store.create(&User::with_id(UserId::from(i as u64))).await.unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add_primary_authenticator(
                        &UserId::from(i as u64),
                        &Authenticator::new("google", "shared"),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut attached = 0;
        for handle in handles {
            if handle.await.unwrap() == AttachOutcome::Attached {
                attached += 1;
            }
        }
        assert_eq!(attached, 1);
    }
}
