use chrono::{DateTime, Utc};

use crate::Role;

/// Session lifecycle events emitted by the
/// [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub enum SessionEvent {
    // bootstrap
    SessionRestored {
        email: String,
        role: Role,
        at: DateTime<Utc>,
    },
    /// Persisted state existed but could not be used and was cleared.
    SessionDiscarded {
        reason: String,
        at: DateTime<Utc>,
    },

    // authentication
    LoginSucceeded {
        email: String,
        role: Role,
        at: DateTime<Utc>,
    },
    LoginFailed {
        email: String,
        reason: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        email: Option<String>,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionRestored { .. } => "session.restored",
            Self::SessionDiscarded { .. } => "session.discarded",
            Self::LoginSucceeded { .. } => "session.login.succeeded",
            Self::LoginFailed { .. } => "session.login.failed",
            Self::LoggedOut { .. } => "session.logged_out",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionRestored { at, .. }
            | Self::SessionDiscarded { at, .. }
            | Self::LoginSucceeded { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LoggedOut { at, .. } => *at,
        }
    }
}
