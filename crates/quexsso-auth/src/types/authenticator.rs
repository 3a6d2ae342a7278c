//! Primary authenticators: external identity-provider credentials attached to a user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An external identity-provider credential.
///
/// Authenticators are identified globally by their [`AuthenticatorKey`]
/// (`type` plus provider-side `id`) and are owned by at most one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authenticator {
    /// Provider-side identifier (e.g. the OAuth subject).
    pub id: String,

    /// Provider kind discriminator (e.g. "google", "github").
    ///
    /// Tokens may omit it; the provisioning flow then fills it from the issuing strategy.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Avatar URL reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Opaque provider-specific payload.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Authenticator {
    /// Creates an authenticator with the given kind and id.
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            avatar: None,
            payload: serde_json::Value::Null,
        }
    }

    /// Sets the avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Sets the provider payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Returns the global identity of this authenticator.
    #[must_use]
    pub fn key(&self) -> AuthenticatorKey {
        AuthenticatorKey::new(&self.kind, &self.id)
    }
}

/// Global identity of an authenticator: `(type, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthenticatorKey {
    /// Provider kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Provider-side identifier.
    pub id: String,
}

impl AuthenticatorKey {
    /// Creates a key from kind and id.
    #[must_use]
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for AuthenticatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_avatar_and_payload() {
        let a = Authenticator::new("google", "g-1").with_avatar("http://a/1.png");
        let b = Authenticator::new("google", "g-1")
            .with_payload(serde_json::json!({ "email": "x@example.com" }));
        assert_ne!(a, b);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key().to_string(), "google/g-1");
    }

    #[test]
    fn test_deserialize_without_type() {
        let json = r#"{ "id": "g-1", "avatar": "http://example.com/a.png" }"#;
        let authenticator: Authenticator = serde_json::from_str(json).unwrap();
        assert_eq!(authenticator.id, "g-1");
        assert!(authenticator.kind.is_empty());
        assert_eq!(
            authenticator.avatar.as_deref(),
            Some("http://example.com/a.png")
        );
        assert!(authenticator.payload.is_null());
    }

    #[test]
    fn test_serialize_uses_type_field() {
        let json = serde_json::to_value(Authenticator::new("github", "octocat")).unwrap();
        assert_eq!(json["type"], "github");
        assert!(json.get("avatar").is_none());
        assert!(json.get("payload").is_none());
    }
}
