//! User records and their projections.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::authenticator::{Authenticator, AuthenticatorKey};
use crate::identity::UserId;

// =============================================================================
// User Type
// =============================================================================

/// A user of the SSO service.
///
/// Only [`Profile`] is safe to expose to requesters other than the user
/// themselves; see [`UserView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: UserId,

    /// Publicly visible profile.
    #[serde(default)]
    pub profile: Profile,

    /// Attached credentials.
    #[serde(default)]
    pub authentication: Authentication,

    /// When the user was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Creates an empty user with a freshly generated id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(UserId::generate())
    }

    /// Creates an empty user with the given id.
    #[must_use]
    pub fn with_id(id: UserId) -> Self {
        Self {
            id,
            profile: Profile::default(),
            authentication: Authentication::default(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Returns `true` if the profile carries the admin flag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile.admin
    }

    /// Returns `true` if the user holds an authenticator with the given key.
    #[must_use]
    pub fn has_authenticator(&self, key: &AuthenticatorKey) -> bool {
        self.authentication.primary.iter().any(|a| &a.key() == key)
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

/// The subset of user fields visible to every authenticated requester.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Administrative privileges.
    #[serde(default)]
    pub admin: bool,

    /// Display name chosen by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Credentials attached to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    /// Primary authenticators in attachment order. Never holds two entries with the same key.
    #[serde(default)]
    pub primary: Vec<Authenticator>,
}

// =============================================================================
// Profile Patch
// =============================================================================

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New display name.
    #[serde(default)]
    pub display_name: Option<String>,

    /// New avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,

    /// New admin flag.
    #[serde(default)]
    pub admin: Option<bool>,
}

impl ProfilePatch {
    /// Patch that only replaces the avatar.
    #[must_use]
    pub fn avatar(avatar: impl Into<String>) -> Self {
        Self {
            avatar: Some(avatar.into()),
            ..Self::default()
        }
    }

    /// Patch that only sets the admin flag.
    #[must_use]
    pub fn admin(admin: bool) -> Self {
        Self {
            admin: Some(admin),
            ..Self::default()
        }
    }

    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.avatar.is_none() && self.admin.is_none()
    }

    /// Returns `true` if the patch touches the admin flag.
    #[must_use]
    pub fn changes_admin(&self) -> bool {
        self.admin.is_some()
    }

    /// Applies the patch in place.
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(display_name) = &self.display_name {
            profile.display_name = Some(display_name.clone());
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = Some(avatar.clone());
        }
        if let Some(admin) = self.admin {
            profile.admin = admin;
        }
    }
}

// =============================================================================
// Projection
// =============================================================================

/// What a requester is allowed to see of a user record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserView {
    /// The full record (self access).
    Full(User),
    /// Only the profile (everyone else).
    Profile(Profile),
}

impl UserView {
    /// Returns the full record if this view carries one.
    #[must_use]
    pub fn into_full(self) -> Option<User> {
        match self {
            Self::Full(user) => Some(user),
            Self::Profile(_) => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_empty() {
        let user = User::new();
        assert!(!user.id.is_empty());
        assert!(!user.is_admin());
        assert!(user.authentication.primary.is_empty());
        assert!(user.profile.avatar.is_none());
    }

    #[test]
    fn test_has_authenticator_matches_by_key() {
        let mut user = User::new();
        user.authentication
            .primary
            .push(Authenticator::new("google", "g-1").with_avatar("http://a"));

        assert!(user.has_authenticator(&AuthenticatorKey::new("google", "g-1")));
        assert!(!user.has_authenticator(&AuthenticatorKey::new("github", "g-1")));
    }

    #[test]
    fn test_profile_patch_apply() {
        let mut profile = Profile {
            admin: false,
            display_name: Some("Old".to_string()),
            avatar: None,
        };

        ProfilePatch::avatar("http://example.com/a.png").apply(&mut profile);
        assert_eq!(profile.display_name.as_deref(), Some("Old"));
        assert_eq!(profile.avatar.as_deref(), Some("http://example.com/a.png"));
        assert!(!profile.admin);

        ProfilePatch::admin(true).apply(&mut profile);
        assert!(profile.admin);
    }

    #[test]
    fn test_profile_patch_predicates() {
        assert!(ProfilePatch::default().is_empty());
        assert!(!ProfilePatch::avatar("x").changes_admin());
        assert!(ProfilePatch::admin(false).changes_admin());
    }

    #[test]
    fn test_user_serialization_shape() {
        let mut user = User::with_id(UserId::new("42"));
        user.profile.admin = true;
        user.authentication
            .primary
            .push(Authenticator::new("google", "g-1"));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["profile"]["admin"], true);
        assert_eq!(json["authentication"]["primary"][0]["id"], "g-1");
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_profile_view_hides_authentication() {
        let user = User::with_id(UserId::new("7"));
        let json = serde_json::to_value(UserView::Profile(user.profile.clone())).unwrap();
        assert!(json.get("authentication").is_none());
        assert!(json.get("id").is_none());
        assert_eq!(json["admin"], false);

        let json = serde_json::to_value(UserView::Full(user)).unwrap();
        assert!(json.get("authentication").is_some());
    }
}
