//! Explicit authorization checks.
//!
//! Every route calls into [`AccessGuard`] before touching a collaborator.
//! The guard classifies the caller relative to the target user and answers
//! allow/deny per operation class:
//!
//! | Operation | Unauthenticated | Self | Other (admin) | Other |
//! |-----------|-----------------|------|---------------|-------|
//! | read user | deny | full record | profile only | profile only |
//! | list users | deny | admin only | allow | deny |
//! | delete / modify | deny | allow | allow | deny |
//! | attach own authenticator | deny | allow | deny | deny |
//!
//! Ids are compared in their canonical [`UserId`] form.

use crate::AuthResult;
use crate::error::AuthError;
use crate::identity::UserId;

const MISSING_AUTHENTICATION: &str = "Missing user authentication.";
const NO_PERMISSION: &str = "User doesn't have permission to access this resource.";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    /// Requester's user id.
    pub user_id: UserId,
    /// Whether the requester's profile carries the admin flag.
    pub admin: bool,
}

impl Requester {
    /// Creates a requester.
    #[must_use]
    pub fn new(user_id: UserId, admin: bool) -> Self {
        Self { user_id, admin }
    }
}

/// How the caller relates to the target user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// No requester identity.
    Unauthenticated,
    /// The requester is the target user.
    SelfAccess,
    /// The requester is someone else.
    Other {
        /// Whether that someone is an admin.
        admin: bool,
    },
}

/// Which projection of a user record a reader may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadView {
    /// The whole record.
    Full,
    /// Only `profile`.
    ProfileOnly,
}

/// Stateless authorization decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGuard;

impl AccessGuard {
    /// Classifies `requester` relative to `target`.
    #[must_use]
    pub fn classify(requester: Option<&Requester>, target: &UserId) -> Relation {
        match requester {
            None => Relation::Unauthenticated,
            Some(r) if &r.user_id == target => Relation::SelfAccess,
            Some(r) => Relation::Other { admin: r.admin },
        }
    }

    /// Requires any authenticated requester.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if there is none.
    pub fn require_authenticated(requester: Option<&Requester>) -> AuthResult<&Requester> {
        requester.ok_or_else(|| {
            tracing::debug!("Rejected request without requester identity");
            AuthError::unauthenticated(MISSING_AUTHENTICATION)
        })
    }

    /// Requires an admin requester (listing, granting admin).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` or `AuthError::Forbidden`.
    pub fn require_admin(requester: Option<&Requester>) -> AuthResult<&Requester> {
        let requester = Self::require_authenticated(requester)?;
        if requester.admin {
            Ok(requester)
        } else {
            tracing::debug!(user_id = %requester.user_id, "Admin privileges required");
            Err(AuthError::forbidden(NO_PERMISSION))
        }
    }

    /// Requires the requester to be `target` or an admin (destructive operations).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` or `AuthError::Forbidden`.
    pub fn require_self_or_admin(
        requester: Option<&Requester>,
        target: &UserId,
    ) -> AuthResult<Relation> {
        match Self::classify(requester, target) {
            Relation::Unauthenticated => Err(AuthError::unauthenticated(MISSING_AUTHENTICATION)),
            relation @ (Relation::SelfAccess | Relation::Other { admin: true }) => Ok(relation),
            Relation::Other { admin: false } => {
                tracing::debug!(target_user = %target, "Rejected access to another user's resource");
                Err(AuthError::forbidden(NO_PERMISSION))
            }
        }
    }

    /// Requires the requester to be `target` itself.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` or `AuthError::Forbidden`.
    pub fn require_self(requester: Option<&Requester>, target: &UserId) -> AuthResult<()> {
        match Self::classify(requester, target) {
            Relation::Unauthenticated => Err(AuthError::unauthenticated(MISSING_AUTHENTICATION)),
            Relation::SelfAccess => Ok(()),
            Relation::Other { .. } => {
                tracing::debug!(target_user = %target, "Operation restricted to the owner");
                Err(AuthError::forbidden(NO_PERMISSION))
            }
        }
    }

    /// Projection a reader with `relation` may see.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` for [`Relation::Unauthenticated`].
    pub fn read_view(relation: Relation) -> AuthResult<ReadView> {
        match relation {
            Relation::Unauthenticated => Err(AuthError::unauthenticated(MISSING_AUTHENTICATION)),
            Relation::SelfAccess => Ok(ReadView::Full),
            Relation::Other { .. } => Ok(ReadView::ProfileOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> Requester {
        Requester::new(UserId::new(id), false)
    }

    fn admin(id: &str) -> Requester {
        Requester::new(UserId::new(id), true)
    }

    #[test]
    fn test_classify() {
        let target = UserId::new("42");
        assert_eq!(
            AccessGuard::classify(None, &target),
            Relation::Unauthenticated
        );
        assert_eq!(
            AccessGuard::classify(Some(&user("42")), &target),
            Relation::SelfAccess
        );
        assert_eq!(
            AccessGuard::classify(Some(&admin("1")), &target),
            Relation::Other { admin: true }
        );
    }

    #[test]
    fn test_numeric_and_padded_ids_are_self() {
        let requester: Requester = Requester::new(serde_json::from_str("42").unwrap(), false);
        assert_eq!(
            AccessGuard::classify(Some(&requester), &UserId::new("0042")),
            Relation::SelfAccess
        );
    }

    #[test]
    fn test_unauthenticated_is_rejected_everywhere() {
        let target = UserId::new("1");
        assert!(matches!(
            AccessGuard::require_authenticated(None),
            Err(AuthError::Unauthenticated { .. })
        ));
        assert!(matches!(
            AccessGuard::require_admin(None),
            Err(AuthError::Unauthenticated { .. })
        ));
        assert!(matches!(
            AccessGuard::require_self_or_admin(None, &target),
            Err(AuthError::Unauthenticated { .. })
        ));
        assert!(matches!(
            AccessGuard::require_self(None, &target),
            Err(AuthError::Unauthenticated { .. })
        ));
        assert!(AccessGuard::read_view(Relation::Unauthenticated).is_err());
    }

    #[test]
    fn test_listing_requires_admin() {
        assert!(AccessGuard::require_admin(Some(&admin("1"))).is_ok());
        let err = AccessGuard::require_admin(Some(&user("1"))).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden { .. }));
        assert_eq!(err.message(), NO_PERMISSION);
    }

    #[test]
    fn test_destructive_operations() {
        let target = UserId::new("7");
        assert_eq!(
            AccessGuard::require_self_or_admin(Some(&user("7")), &target).unwrap(),
            Relation::SelfAccess
        );
        assert!(AccessGuard::require_self_or_admin(Some(&admin("1")), &target).is_ok());
        assert!(matches!(
            AccessGuard::require_self_or_admin(Some(&user("8")), &target),
            Err(AuthError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_owner_only_operations_exclude_admins() {
        let target = UserId::new("7");
        assert!(AccessGuard::require_self(Some(&user("7")), &target).is_ok());
        assert!(AccessGuard::require_self(Some(&admin("1")), &target).is_err());
    }

    #[test]
    fn test_read_view() {
        assert_eq!(
            AccessGuard::read_view(Relation::SelfAccess).unwrap(),
            ReadView::Full
        );
        assert_eq!(
            AccessGuard::read_view(Relation::Other { admin: false }).unwrap(),
            ReadView::ProfileOnly
        );
        assert_eq!(
            AccessGuard::read_view(Relation::Other { admin: true }).unwrap(),
            ReadView::ProfileOnly
        );
    }
}
