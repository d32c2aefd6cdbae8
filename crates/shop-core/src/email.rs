//! Email address type.
//!
//! Guests identify their orders by email, and registered users log in with
//! one, so both paths need the same notion of "syntactically valid".

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// A syntactically valid, trimmed email address.
///
/// ## Rules
/// - exactly one `@`
/// - non-empty local part
/// - domain contains a `.` that is neither its first nor last character
/// - no whitespace anywhere
///
/// ```rust
/// use shop_core::Email;
///
/// let email = Email::parse("  guest@example.com ").unwrap();
/// assert_eq!(email.as_str(), "guest@example.com");
///
/// assert!(Email::parse("no-at-sign").is_err());
/// assert!(Email::parse("a@b@c.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse and validate an email address.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();

        if value.is_empty() {
            return Err(ValidationError::Required {
                field: "email".to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: reason.to_string(),
        };

        if value.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }

        let (local, domain) = value
            .split_once('@')
            .ok_or_else(|| invalid("missing @"))?;

        if domain.contains('@') {
            return Err(invalid("must contain exactly one @"));
        }
        if local.is_empty() {
            return Err(invalid("missing local part"));
        }
        if domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.') {
            return Err(invalid("invalid domain"));
        }

        Ok(Self(value.to_string()))
    }

    /// Get the email as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("demo@local.test").is_ok());
        assert!(Email::parse("first.last+tag@sub.domain.co.id").is_ok());
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let email = Email::parse("\tuser@example.com  ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_invalid_emails() {
        assert!(matches!(Email::parse(""), Err(ValidationError::Required { .. })));
        assert!(matches!(Email::parse("   "), Err(ValidationError::Required { .. })));
        assert!(Email::parse("plainaddress").is_err());
        assert!(Email::parse("@example.com").is_err());
        assert!(Email::parse("user@").is_err());
        assert!(Email::parse("user@localhost").is_err());
        assert!(Email::parse("user@.com").is_err());
        assert!(Email::parse("user@example.").is_err());
        assert!(Email::parse("us er@example.com").is_err());
        assert!(Email::parse("a@b@example.com").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"user@example.com\"").unwrap();
        assert_eq!(email.to_string(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
