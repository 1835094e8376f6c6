//! Redacting wrapper for credentials.
//!
//! Bearer tokens and passwords pass through logs, `Debug` output of
//! [`Session`](crate::Session) and error values. [`SecretString`] keeps them
//! out of all of those.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Holds a bearer token or a password.
///
/// Prints as `[REDACTED]`, so a [`Session`](crate::Session) or a
/// [`LoginRequest`](crate::api::LoginRequest) can be logged with `?`.
/// Serializes as the raw value.
///
/// ```rust
/// use taskboard_session::{Role, Session};
///
/// let session = Session::new("Ada", "ada@example.com", Role::Admin, "tok_ada").unwrap();
///
/// assert!(!format!("{session:?}").contains("tok_ada"));
/// assert_eq!(session.token.expose_secret(), "tok_ada");
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SecretString(String);

impl SecretString {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw value. Only call this at the point the value leaves
    /// the process (an `Authorization` header, the store, a request body).
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // the store and the login request body need the real value
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}
