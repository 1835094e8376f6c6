//! Session store trait and the persisted entry layout.

use async_trait::async_trait;

use super::Session;
use crate::AuthError;

/// Key of the raw bearer token entry.
pub const TOKEN_KEY: &str = "token";

/// Key of the serialized session entry.
pub const SESSION_KEY: &str = "user";

/// Durable mirror of the current session.
///
/// The store holds two entries, [`TOKEN_KEY`] and [`SESSION_KEY`], and only
/// ever writes or removes them together.
///
/// Implementations:
/// - [`FileSessionStore`](super::FileSessionStore): a JSON document on disk
/// - [`InMemorySessionStore`](super::InMemorySessionStore): process memory
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes both entries, replacing any previous session.
    async fn save(&self, session: &Session) -> Result<(), AuthError>;

    /// Reads the persisted session.
    ///
    /// Returns `Ok(None)` when neither entry exists and
    /// [`AuthError::Corrupted`] when the entries are partial or unusable.
    async fn load(&self) -> Result<Option<Session>, AuthError>;

    /// Removes both entries. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), AuthError>;
}

/// Encodes a session into its `(token, user)` entry values.
pub(crate) fn encode_entries(session: &Session) -> Result<(String, String), AuthError> {
    let user = serde_json::to_string(session)
        .map_err(|e| AuthError::Storage(format!("Failed to serialize session: {e}")))?;
    Ok((session.token.expose_secret().to_owned(), user))
}

/// Rebuilds a session from raw entry values.
pub(crate) fn decode_entries(
    token: Option<&str>,
    user: Option<&str>,
) -> Result<Option<Session>, AuthError> {
    let (token, user) = match (token, user) {
        (None, None) => return Ok(None),
        (Some(token), Some(user)) => (token, user),
        (Some(_), None) => {
            return Err(AuthError::Corrupted(format!(
                "`{TOKEN_KEY}` entry present without `{SESSION_KEY}`"
            )));
        }
        (None, Some(_)) => {
            return Err(AuthError::Corrupted(format!(
                "`{SESSION_KEY}` entry present without `{TOKEN_KEY}`"
            )));
        }
    };

    let session: Session = serde_json::from_str(user)
        .map_err(|e| AuthError::Corrupted(format!("Failed to parse session entry: {e}")))?;
    session.validate().map_err(AuthError::Corrupted)?;

    if session.token.expose_secret() != token {
        return Err(AuthError::Corrupted(
            "token entry does not match session".to_owned(),
        ));
    }

    Ok(Some(session))
}
