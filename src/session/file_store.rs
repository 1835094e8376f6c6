//! File-based session storage.
//!
//! Stores both session entries in a single JSON document so they can only be
//! replaced together.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::store::{SESSION_KEY, SessionStore, TOKEN_KEY, decode_entries, encode_entries};
use super::Session;
use crate::AuthError;

/// File-based session storage.
///
/// The file holds a JSON object with a `token` and a `user` entry. Writes go
/// to a sibling temporary file first and are moved into place with a rename,
/// so a crash mid-write leaves either the old document or the new one.
///
/// # Example
///
/// ```rust,no_run
/// use taskboard_session::FileSessionStore;
///
/// let store = FileSessionStore::new("/home/me/.taskboard/session.json")?;
/// # Ok::<(), taskboard_session::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by `path`.
    ///
    /// Creates the parent directory if it doesn't exist. The file itself is
    /// only created on the first `save`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuthError::Storage(format!("Failed to create session directory: {e}"))
            })?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AuthError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Storage(format!("Failed to read session file: {e}")))?;

        serde_json::from_str(&content)
            .map_err(|e| AuthError::Corrupted(format!("Failed to parse session file: {e}")))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &Session) -> Result<(), AuthError> {
        let (token, user) = encode_entries(session)?;

        let mut entries = BTreeMap::new();
        entries.insert(TOKEN_KEY, token);
        entries.insert(SESSION_KEY, user);

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| AuthError::Storage(format!("Failed to serialize session: {e}")))?;

        let temp = self.temp_path();
        std::fs::write(&temp, content)
            .map_err(|e| AuthError::Storage(format!("Failed to write session file: {e}")))?;
        std::fs::rename(&temp, &self.path)
            .map_err(|e| AuthError::Storage(format!("Failed to replace session file: {e}")))?;

        tracing::debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, AuthError> {
        let entries = self.read_entries()?;
        decode_entries(
            entries.get(TOKEN_KEY).map(String::as_str),
            entries.get(SESSION_KEY).map(String::as_str),
        )
    }

    async fn clear(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                AuthError::Storage(format!("Failed to delete session file: {e}"))
            })?;
        }
        Ok(())
    }
}
