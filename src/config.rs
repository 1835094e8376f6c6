//! Client configuration.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use taskboard_session::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://tasks.example.com/api")
//!     .unwrap()
//!     .with_request_timeout(Duration::from_secs(10));
//!
//! assert_eq!(config.base_url.as_str(), "https://tasks.example.com/api/");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Environment variable holding the REST API base URL.
pub const ENV_API_URL: &str = "TASKBOARD_API_URL";
/// Environment variable holding the session file path.
pub const ENV_SESSION_FILE: &str = "TASKBOARD_SESSION_FILE";
/// Environment variable holding the request timeout in whole seconds.
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TASKBOARD_REQUEST_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:3000/";
const DEFAULT_SESSION_FILE: &str = ".taskboard/session.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for the HTTP client and the file session store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every API path is resolved against. Always ends with `/`.
    pub base_url: Url,

    /// Upper bound on a single request, login included.
    ///
    /// Default: `None` (wait indefinitely).
    pub request_timeout: Option<Duration>,

    /// Where [`FileSessionStore`](crate::FileSessionStore) keeps the session.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            request_timeout: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ClientConfig {
    /// Reads the configuration from the process environment, falling back
    /// to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config = config.with_base_url(url.trim())?;
        }

        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.trim().is_empty()) {
            config.session_file = PathBuf::from(path);
        }

        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::Invalid {
                name: ENV_REQUEST_TIMEOUT_SECS,
                reason: format!("{e}"),
            })?;
            // zero means no timeout
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the API base URL. A trailing `/` is added so relative API paths
    /// keep any base path such as `/api`.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        let mut parsed = Url::parse(url).map_err(|e| ConfigError::Invalid {
            name: ENV_API_URL,
            reason: e.to_string(),
        })?;

        if parsed.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: ENV_API_URL,
                reason: format!("`{url}` cannot be used as a base URL"),
            });
        }

        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        self.base_url = parsed;
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }
}
