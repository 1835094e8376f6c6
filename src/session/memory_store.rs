//! In-memory session storage.
//!
//! Suitable for tests and for hosts that do not need the session to survive
//! a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::store::{SESSION_KEY, SessionStore, TOKEN_KEY, decode_entries, encode_entries};
use super::Session;
use crate::AuthError;

/// In-memory session storage.
///
/// Holds the two entries in a `HashMap` behind a `RwLock`. Clones share the
/// same map, so a test can keep a handle to the store it gave the manager.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<RwLock<HashMap<&'static str, String>>>,
    writes: Arc<AtomicU64>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value stored under `key`.
    pub fn entry(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Writes a single raw entry, bypassing the paired `save`.
    ///
    /// Lets tests seed the store with state another process left behind.
    pub fn insert_raw(&self, key: &'static str, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, value.into());
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .map(|entries| entries.is_empty())
            .unwrap_or(true)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &Session) -> Result<(), AuthError> {
        let (token, user) = encode_entries(session)?;

        {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| AuthError::Storage("Lock poisoned".to_owned()))?;
            entries.insert(TOKEN_KEY, token);
            entries.insert(SESSION_KEY, user);
        }

        self.writes.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }

    async fn load(&self) -> Result<Option<Session>, AuthError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| AuthError::Storage("Lock poisoned".to_owned()))?;

        decode_entries(
            entries.get(TOKEN_KEY).map(String::as_str),
            entries.get(SESSION_KEY).map(String::as_str),
        )
    }

    async fn clear(&self) -> Result<(), AuthError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuthError::Storage("Lock poisoned".to_owned()))?;
        entries.remove(TOKEN_KEY);
        entries.remove(SESSION_KEY);
        Ok(())
    }
}
