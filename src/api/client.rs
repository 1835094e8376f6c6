use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiEnvelope, ApiError, AuthGateway, LOGIN_ENDPOINT, LoginBody, LoginRequest};
use crate::SecretString;
use crate::config::ClientConfig;

/// Supplies the bearer token attached to outgoing requests.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<SecretString>;
}

/// HTTP client for the task manager REST API.
///
/// Every response is decoded as an [`ApiEnvelope`]. When a [`TokenSource`]
/// is attached and currently holds a token, requests carry an
/// `Authorization: Bearer` header.
///
/// # Example
///
/// ```rust,no_run
/// use taskboard_session::api::ApiClient;
/// use taskboard_session::config::ClientConfig;
///
/// # async fn run() -> Result<(), taskboard_session::api::ApiError> {
/// let client = ApiClient::new(&ClientConfig::default())?;
/// let employees: serde_json::Value = client
///     .get("users/employees")
///     .await?
///     .body
///     .unwrap_or_default();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            http,
            tokens: None,
        })
    }

    /// Returns a client that authenticates with tokens from `source`.
    pub fn with_token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.tokens = Some(Arc::new(source));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    pub async fn get<T>(&self, path: &str) -> Result<ApiEnvelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(self.http.get(url)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(self.http.post(url).json(body)).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiEnvelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(self.http.put(url).json(body)).await
    }

    pub async fn delete<T>(&self, path: &str) -> Result<ApiEnvelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(self.http.delete(url)).await
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<ApiEnvelope<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = match self.tokens.as_ref().and_then(|t| t.bearer_token()) {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, timeout = e.is_timeout(), "request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = envelope_message(&bytes);
            tracing::debug!(status = status.as_u16(), ?message, "request rejected");

            return Err(if status == StatusCode::UNAUTHORIZED {
                ApiError::Unauthorized { message }
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Best-effort extraction of `message` from an error response body.
fn envelope_message(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(str::to_owned)
}

#[async_trait]
impl AuthGateway for ApiClient {
    #[tracing::instrument(name = "api_login", skip_all, fields(email = %request.email))]
    async fn login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginBody>, ApiError> {
        self.post(LOGIN_ENDPOINT, request).await
    }
}
