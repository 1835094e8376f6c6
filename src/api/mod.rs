//! REST collaborator: response envelope, login contract and HTTP client.

mod client;

use async_trait::async_trait;
pub use client::{ApiClient, TokenSource};
use serde::{Deserialize, Serialize};

use crate::{Role, SecretString, Session};

/// Path of the login endpoint, relative to the API base URL.
pub const LOGIN_ENDPOINT: &str = "users/login";

/// The `{statusCode, message, body?}` wrapper every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    pub body: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Identity returned by a successful login, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub token: SecretString,
}

impl TryFrom<LoginBody> for Session {
    type Error = String;

    fn try_from(body: LoginBody) -> Result<Self, Self::Error> {
        let role: Role = body.role.parse()?;
        Session::new(body.name, body.email, role, body.token)
    }
}

/// Failures of a REST call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response: connection refused, DNS,
    /// TLS, timeout.
    #[error("Request failed: {0}")]
    Transport(String),

    /// HTTP 401. The token is missing, expired or revoked.
    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    #[error("HTTP {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Message the server attached to a rejected request, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Authentication collaborator used by the session manager.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchanges credentials for a login envelope.
    async fn login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginBody>, ApiError>;
}
