//! Session core of the Todo Manager client.
//!
//! - [`SessionManager`] owns the current [`Session`]: it restores it at
//!   start-up, logs in against the REST API and logs out.
//! - [`SessionStore`] implementations keep a durable mirror of the session.
//! - [`RouteGuard`] and [`RouteTable`](routes::RouteTable) decide, per
//!   navigation, whether a view may render.
//! - [`ApiClient`] talks to the REST API and attaches the session's bearer
//!   token.

pub mod api;
pub mod config;
pub mod events;
pub mod guard;
pub mod manager;
pub mod routes;
pub mod secret;
pub mod session;
pub mod validators;

pub use api::{ApiClient, ApiError, AuthGateway, TokenSource};
pub use config::ClientConfig;
pub use guard::{GuardOutcome, RouteGuard};
pub use manager::{SessionManager, SessionReader};
pub use secret::SecretString;
pub use session::{
    FileSessionStore, InMemorySessionStore, Role, Session, SessionState, SessionStore,
};
pub use validators::ValidationError;

/// Errors surfaced by session operations.
///
/// The `Display` output of [`AuthError::Authentication`] and
/// [`AuthError::Transport`] is meant to be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Credentials rejected, or the server answered with something that is
    /// not a usable session.
    #[error("{0}")]
    Authentication(String),

    /// The API could not be reached.
    #[error("{0}")]
    Transport(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session store could not be read or written.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// Persisted session data exists but is partial or unreadable.
    #[error("Persisted session is corrupted: {0}")]
    Corrupted(String),
}
