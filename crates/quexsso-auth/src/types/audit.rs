//! Audit event records.
//!
//! Events are immutable once written; storage backends only append and list.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::identity::UserId;

/// Event type constants emitted by this service.
pub mod event_types {
    /// A user record was created.
    pub const CREATE_USER: &str = "com.quexten.sso.createUser";
    /// A primary authenticator was attached to a user.
    pub const ADD_PRIMARY_AUTHENTICATOR: &str = "com.quexten.sso.addPrimaryAuthenticator";
    /// A primary authenticator was detached from a user.
    pub const REMOVE_PRIMARY_AUTHENTICATOR: &str = "com.quexten.sso.removePrimaryAuthenticator";
    /// A user's profile was changed.
    pub const UPDATE_PROFILE: &str = "com.quexten.sso.updateProfile";
    /// A user record was deleted.
    pub const DELETE_USER: &str = "com.quexten.sso.deleteUser";
}

/// Where an audited action came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOrigin {
    /// Requester id, forwarded client address, or `"anonymous"`.
    pub sender: String,

    /// `User-Agent` of the request, if sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl AuditOrigin {
    /// Sender used when nothing identifies the caller.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Creates an origin with the given sender and no user agent.
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            user_agent: None,
        }
    }

    /// Origin for actions the service performs on its own (e.g. bootstrap).
    #[must_use]
    pub fn system() -> Self {
        Self::new("system")
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// An immutable record of an administrative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique event id.
    pub id: Uuid,

    /// User the event is about.
    pub subject: UserId,

    /// Event-specific details.
    pub payload: serde_json::Value,

    /// One of the [`event_types`] constants.
    pub event_type: String,

    /// Who triggered the event.
    pub sender: String,

    /// `User-Agent` of the triggering request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// When the event was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl AuditEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(
        subject: UserId,
        payload: serde_json::Value,
        event_type: impl Into<String>,
        origin: &AuditOrigin,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject,
            payload,
            event_type: event_type.into(),
            sender: origin.sender.clone(),
            user_agent: origin.user_agent.clone(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_copies_origin() {
        let origin = AuditOrigin::new("42").with_user_agent("curl/8.0");
        let event = AuditEvent::new(
            UserId::new("42"),
            serde_json::json!({ "userId": "42" }),
            event_types::CREATE_USER,
            &origin,
        );

        assert_eq!(event.sender, "42");
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(event.event_type, "com.quexten.sso.createUser");
    }

    #[test]
    fn test_event_serialization() {
        let event = AuditEvent::new(
            UserId::new("1"),
            serde_json::json!({}),
            event_types::DELETE_USER,
            &AuditOrigin::system(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "com.quexten.sso.deleteUser");
        assert_eq!(json["sender"], "system");
        assert!(json.get("userAgent").is_none());
        assert!(json["timestamp"].is_string());
    }
}
