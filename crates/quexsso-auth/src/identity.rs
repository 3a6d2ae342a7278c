//! Canonical user identifiers.
//!
//! User ids reach the service from several places: URL path segments, token
//! subjects (which some issuers encode as JSON numbers) and stored records.
//! [`UserId`] normalizes all of them at the boundary so comparisons never
//! depend on the original representation.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque user identifier in canonical form.
///
/// Canonicalization trims surrounding whitespace and strips leading zeros from
/// all-digit ids, so `"0042"`, `" 42"` and the JSON number `42` are the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id from any string, canonicalizing it.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(canonicalize(raw.as_ref()))
    }

    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty after canonicalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }
    trimmed.to_string()
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for UserId {
    fn eq(&self, other: &str) -> bool {
        self.0 == canonicalize(other)
    }
}

impl PartialEq<&str> for UserId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == canonicalize(other)
    }
}

impl Serialize for UserId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct UserIdVisitor;

        impl Visitor<'_> for UserIdVisitor {
            type Value = UserId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a user id as a string or a non-negative integer")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(UserId::new(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(UserId::from(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(UserId::from)
                    .map_err(|_| E::custom("user id must not be negative"))
            }
        }

        deserializer.deserialize_any(UserIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_string_forms_are_equal() {
        let from_number: UserId = serde_json::from_str("42").unwrap();
        let from_string: UserId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, UserId::new("0042"));
        assert_eq!(from_number, UserId::new(" 42 "));
        assert_eq!(from_number, "42");
    }

    #[test]
    fn test_non_numeric_ids_keep_their_form() {
        let id = UserId::new("  a1b2-c3 ");
        assert_eq!(id.as_str(), "a1b2-c3");
        assert_ne!(id, UserId::new("A1B2-C3"));
    }

    #[test]
    fn test_zero_is_preserved() {
        assert_eq!(UserId::new("000").as_str(), "0");
    }

    #[test]
    fn test_negative_numbers_are_rejected() {
        assert!(serde_json::from_str::<UserId>("-1").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = UserId::from(7_u64);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(UserId::generate(), UserId::generate());
    }
}
