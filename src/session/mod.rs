mod file_store;
mod memory_store;
mod store;

use std::fmt;
use std::str::FromStr;

pub use file_store::FileSessionStore;
pub use memory_store::InMemorySessionStore;
use serde::{Deserialize, Serialize};
pub use store::{SESSION_KEY, SessionStore, TOKEN_KEY};

use crate::SecretString;

/// Access level carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }

    /// Landing path for users of this role.
    pub fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Employee => "/employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}

/// The authenticated identity and credential of the current user.
///
/// A `Session` is always complete: every constructor path goes through
/// [`Session::validate`], so holding one means all four fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: SecretString,
}

impl Session {
    /// Builds a session, rejecting empty fields.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        token: impl Into<SecretString>,
    ) -> Result<Self, String> {
        let session = Self {
            name: name.into(),
            email: email.into(),
            role,
            token: token.into(),
        };
        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("session name is empty".to_owned());
        }
        if self.email.trim().is_empty() {
            return Err("session email is empty".to_owned());
        }
        if self.token.is_empty() {
            return Err("session token is empty".to_owned());
        }
        Ok(())
    }
}

/// What the rest of the application can know about the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Start-up has not finished reading the store yet.
    #[default]
    Pending,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
