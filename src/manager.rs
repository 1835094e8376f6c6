//! The session manager: single owner of "who is logged in".

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};

use crate::api::{ApiError, AuthGateway, LoginRequest};
use crate::events::{EventRegistry, SessionEvent};
use crate::session::{Session, SessionState, SessionStore};
use crate::validators::validate_credentials;
use crate::{AuthError, SecretString};

/// Message used when a login fails without a server-provided reason.
pub const LOGIN_FAILED: &str = "Login failed";

/// Owns the in-memory session and its durable mirror.
///
/// The lifecycle is `initialize` once at start-up, then any number of
/// `login`/`logout` calls. Other components observe the state through a
/// [`SessionReader`] obtained from [`SessionManager::reader`]; only the
/// manager writes to the store.
///
/// # Example
///
/// ```rust,no_run
/// use taskboard_session::{ApiClient, ClientConfig, FileSessionStore, SessionManager};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::from_env()?;
/// let store = FileSessionStore::new(&config.session_file)?;
/// let manager = SessionManager::new(store, ApiClient::new(&config)?);
///
/// manager.initialize().await;
/// if !manager.is_authenticated() {
///     let session = manager.login("ada@example.com", "secret").await?;
///     println!("welcome {}", session.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionManager<S: SessionStore, G: AuthGateway> {
    store: S,
    gateway: G,
    state: watch::Sender<SessionState>,
    /// Held while the store and the published state are updated together.
    transition: Mutex<()>,
    events: Option<Arc<EventRegistry>>,
}

impl<S: SessionStore, G: AuthGateway> SessionManager<S, G> {
    /// Creates a manager in the `Pending` state.
    pub fn new(store: S, gateway: G) -> Self {
        let (state, _) = watch::channel(SessionState::Pending);
        Self {
            store,
            gateway,
            state,
            transition: Mutex::new(()),
            events: None,
        }
    }

    pub fn with_events(mut self, events: Arc<EventRegistry>) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns a read-only handle on the session state.
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            state: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Restores the persisted session, if any, without touching the
    /// network.
    ///
    /// Never fails: unreadable or inconsistent persisted state is cleared
    /// and the manager becomes unauthenticated. Only the first call that
    /// finds the manager `Pending` has an effect, and a login that finished
    /// while the store was being read is kept, in memory and in the store.
    #[tracing::instrument(name = "initialize_session", skip_all)]
    pub async fn initialize(&self) {
        if !self.state.borrow().is_pending() {
            tracing::debug!("session already initialized");
            return;
        }

        let loaded = self.store.load().await;

        let guard = self.transition.lock().await;
        if !self.state.borrow().is_pending() {
            tracing::debug!("session settled while loading, keeping it");
            return;
        }

        let (restored, event) = match loaded {
            Ok(Some(session)) => {
                tracing::info!(email = %session.email, role = %session.role, "session restored");
                let event = SessionEvent::SessionRestored {
                    email: session.email.clone(),
                    role: session.role,
                    at: Utc::now(),
                };
                (SessionState::Authenticated(session), Some(event))
            }
            Ok(None) => {
                tracing::debug!("no persisted session");
                (SessionState::Unauthenticated, None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted session");
                if matches!(e, AuthError::Corrupted(_)) {
                    if let Err(clear_err) = self.store.clear().await {
                        tracing::warn!(error = %clear_err, "failed to clear persisted session");
                    }
                }
                let event = SessionEvent::SessionDiscarded {
                    reason: e.to_string(),
                    at: Utc::now(),
                };
                (SessionState::Unauthenticated, Some(event))
            }
        };

        self.state.send_replace(restored);
        drop(guard);

        if let Some(event) = event {
            self.emit(event).await;
        }
    }

    /// Authenticates against the API and persists the resulting session.
    ///
    /// # Returns
    ///
    /// - `Ok(session)` - the store holds `session` and the manager is
    ///   authenticated
    /// - `Err(AuthError::Validation(_))` - empty email or password, nothing
    ///   was sent
    /// - `Err(AuthError::Authentication(message))` - rejected or malformed
    ///   response; `message` is fit for display
    /// - `Err(AuthError::Transport(_))` - the API could not be reached
    /// - `Err(AuthError::Storage(_))` - the session could not be persisted
    ///
    /// On any error the store and the in-memory state are left untouched.
    #[tracing::instrument(name = "login", skip_all, fields(email = %email), err)]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match self.try_login(email, password).await {
            Ok(session) => {
                self.emit(SessionEvent::LoginSucceeded {
                    email: session.email.clone(),
                    role: session.role,
                    at: Utc::now(),
                })
                .await;
                tracing::info!(role = %session.role, "login success");
                Ok(session)
            }
            Err(e) => {
                self.emit(SessionEvent::LoginFailed {
                    email: email.to_owned(),
                    reason: e.to_string(),
                    at: Utc::now(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password)?;

        let request = LoginRequest {
            email: email.trim().to_owned(),
            password: SecretString::new(password),
        };

        let envelope = self
            .gateway
            .login(&request)
            .await
            .map_err(login_failure)?;

        if !envelope.is_ok() {
            return Err(AuthError::Authentication(display_message(&envelope.message)));
        }

        let body = envelope.body.ok_or_else(|| {
            AuthError::Authentication(display_message(&envelope.message))
        })?;

        let session = Session::try_from(body).map_err(|reason| {
            tracing::warn!(%reason, "malformed login response");
            AuthError::Authentication("Malformed login response".to_owned())
        })?;

        let _guard = self.transition.lock().await;
        self.store.save(&session).await?;
        self.state
            .send_replace(SessionState::Authenticated(session.clone()));

        Ok(session)
    }

    /// Forgets the current session in memory and in the store.
    ///
    /// Idempotent and infallible: a store failure is logged, the in-memory
    /// session is dropped regardless.
    #[tracing::instrument(name = "logout", skip_all)]
    pub async fn logout(&self) {
        let previous = {
            let _guard = self.transition.lock().await;
            if let Err(e) = self.store.clear().await {
                tracing::warn!(error = %e, "failed to clear persisted session");
            }
            self.state.send_replace(SessionState::Unauthenticated)
        };
        let email = previous.session().map(|s| s.email.clone());

        if email.is_some() {
            tracing::info!("logout success");
        }

        self.emit(SessionEvent::LoggedOut {
            email,
            at: Utc::now(),
        })
        .await;
    }

    async fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            events.dispatch(&event).await;
        }
    }
}

/// Maps a failed login call onto the user-facing error.
fn login_failure(error: ApiError) -> AuthError {
    match error {
        ApiError::Transport(detail) => {
            tracing::warn!(%detail, "login request failed");
            AuthError::Transport(LOGIN_FAILED.to_owned())
        }
        ApiError::Decode(detail) => {
            tracing::warn!(%detail, "malformed login response");
            AuthError::Authentication("Malformed login response".to_owned())
        }
        ApiError::InvalidUrl(detail) => {
            tracing::warn!(%detail, "login endpoint is not a valid URL");
            AuthError::Transport(LOGIN_FAILED.to_owned())
        }
        rejected => AuthError::Authentication(display_message(
            rejected.server_message().unwrap_or_default(),
        )),
    }
}

fn display_message(message: &str) -> String {
    if message.trim().is_empty() {
        LOGIN_FAILED.to_owned()
    } else {
        message.to_owned()
    }
}

/// Read-only view of the session state.
///
/// Cheap to clone; every clone sees the manager's latest state.
#[derive(Clone)]
pub struct SessionReader {
    state: watch::Receiver<SessionState>,
}

impl SessionReader {
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Waits until initialization has settled and returns the state.
    ///
    /// Resolves to `Unauthenticated` if the manager is dropped first.
    pub async fn ready(&self) -> SessionState {
        let mut state = self.state.clone();
        let settled = state
            .wait_for(|s| !s.is_pending())
            .await
            .map(|s| s.clone());
        settled.unwrap_or(SessionState::Unauthenticated)
    }
}

impl crate::api::TokenSource for SessionReader {
    fn bearer_token(&self) -> Option<SecretString> {
        self.state.borrow().session().map(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::Role;
    use crate::api::{ApiEnvelope, LoginBody, TokenSource};
    use crate::session::{InMemorySessionStore, SESSION_KEY, TOKEN_KEY};

    /// Answers every login with a fixed result and counts calls.
    struct MockGateway {
        reply: Result<ApiEnvelope<LoginBody>, ApiError>,
        calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn replying(reply: Result<ApiEnvelope<LoginBody>, ApiError>) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn accepting(role: &str) -> Self {
            Self::replying(Ok(ApiEnvelope {
                status_code: 200,
                message: "Login successful".to_owned(),
                body: Some(LoginBody {
                    name: "Ada".to_owned(),
                    email: "ada@example.com".to_owned(),
                    role: role.to_owned(),
                    token: SecretString::new("tok_ada"),
                }),
            }))
        }

        fn rejecting(message: &str) -> Self {
            Self::replying(Ok(ApiEnvelope {
                status_code: 401,
                message: message.to_owned(),
                body: None,
            }))
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AuthGateway for MockGateway {
        async fn login(
            &self,
            request: &LoginRequest,
        ) -> Result<ApiEnvelope<LoginBody>, ApiError> {
            self.calls.lock().unwrap().push(request.email.clone());
            self.reply.clone()
        }
    }

    fn stored_session(role: Role) -> Session {
        Session::new("Ada", "ada@example.com", role, "tok_ada").unwrap()
    }

    #[tokio::test]
    async fn test_login_success_persists_session() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), MockGateway::accepting("admin"));

        let session = manager.login("ada@example.com", "pw").await.unwrap();

        assert_eq!(session.role, Role::Admin);
        assert!(manager.is_authenticated());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_login_rejected_writes_nothing() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), MockGateway::rejecting("Invalid credentials"));
        manager.initialize().await;

        let err = manager.login("ada@example.com", "wrong").await.unwrap_err();

        assert_eq!(err, AuthError::Authentication("Invalid credentials".to_owned()));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert!(!manager.is_authenticated());
        assert_eq!(store.save_count(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_login_success_status_without_body_fails() {
        let gateway = MockGateway::replying(Ok(ApiEnvelope {
            status_code: 200,
            message: String::new(),
            body: None,
        }));
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), gateway);

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_login_malformed_body_fails() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), MockGateway::accepting("owner"));

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));
        assert!(!manager.is_authenticated());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_login_store_failure_keeps_state() {
        struct ReadOnlyStore;

        #[async_trait]
        impl SessionStore for ReadOnlyStore {
            async fn save(&self, _session: &Session) -> Result<(), AuthError> {
                Err(AuthError::Storage("read-only".to_owned()))
            }

            async fn load(&self) -> Result<Option<Session>, AuthError> {
                Ok(None)
            }

            async fn clear(&self) -> Result<(), AuthError> {
                Ok(())
            }
        }

        let manager = SessionManager::new(ReadOnlyStore, MockGateway::accepting("admin"));
        manager.initialize().await;

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::Storage("read-only".to_owned()));
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_login_transport_failure() {
        let gateway =
            MockGateway::replying(Err(ApiError::Transport("connection refused".to_owned())));
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), gateway);
        manager.initialize().await;

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::Transport(LOGIN_FAILED.to_owned()));
        assert_eq!(store.save_count(), 0);
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_invalid_endpoint_hides_detail() {
        let gateway = MockGateway::replying(Err(ApiError::InvalidUrl(
            "users/login: relative URL without a base".to_owned(),
        )));
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), gateway);

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::Transport(LOGIN_FAILED.to_owned()));
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_logout_survives_store_failure() {
        struct StuckStore(InMemorySessionStore);

        #[async_trait]
        impl SessionStore for StuckStore {
            async fn save(&self, session: &Session) -> Result<(), AuthError> {
                self.0.save(session).await
            }

            async fn load(&self) -> Result<Option<Session>, AuthError> {
                self.0.load().await
            }

            async fn clear(&self) -> Result<(), AuthError> {
                Err(AuthError::Storage("disk unavailable".to_owned()))
            }
        }

        let manager = SessionManager::new(
            StuckStore(InMemorySessionStore::new()),
            MockGateway::accepting("employee"),
        );
        manager.initialize().await;
        manager.login("ada@example.com", "pw").await.unwrap();

        manager.logout().await;

        assert!(!manager.is_authenticated());
        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    /// Reads the inner store, then holds the result until released.
    struct SlowLoadStore {
        inner: InMemorySessionStore,
        loading: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SessionStore for SlowLoadStore {
        async fn save(&self, session: &Session) -> Result<(), AuthError> {
            self.inner.save(session).await
        }

        async fn load(&self) -> Result<Option<Session>, AuthError> {
            let loaded = self.inner.load().await;
            self.loading.notify_one();
            self.release.notified().await;
            loaded
        }

        async fn clear(&self) -> Result<(), AuthError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn test_login_during_initialize_keeps_store_in_sync() {
        let inner = InMemorySessionStore::new();
        inner.insert_raw(TOKEN_KEY, "tok_orphan");
        let store = SlowLoadStore {
            inner: inner.clone(),
            loading: Notify::new(),
            release: Notify::new(),
        };
        let manager = Arc::new(SessionManager::new(store, MockGateway::accepting("admin")));

        let init = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.initialize().await }
        });
        manager.store.loading.notified().await;

        let session = manager.login("ada@example.com", "pw").await.unwrap();
        manager.store.release.notify_one();
        init.await.unwrap();

        assert!(manager.is_authenticated());
        assert_eq!(inner.load().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_login_http_rejection_uses_server_message() {
        let gateway = MockGateway::replying(Err(ApiError::Unauthorized {
            message: Some("User not found".to_owned()),
        }));
        let manager = SessionManager::new(InMemorySessionStore::new(), gateway);

        let err = manager.login("ghost@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");

        let gateway = MockGateway::replying(Err(ApiError::Status {
            status: 500,
            message: None,
        }));
        let manager = SessionManager::new(InMemorySessionStore::new(), gateway);

        let err = manager.login("ada@example.com", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_login_validation_skips_network() {
        let gateway = MockGateway::accepting("admin");
        let manager = SessionManager::new(InMemorySessionStore::new(), gateway);

        let err = manager.login("", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = manager.login("ada@example.com", "").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        assert_eq!(manager.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_is_idempotent() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), MockGateway::accepting("employee"));

        manager.login("ada@example.com", "pw").await.unwrap();
        manager.logout().await;

        assert!(!manager.is_authenticated());
        assert!(!manager.is_loading());
        assert!(store.is_empty());

        manager.logout().await;
        assert!(!manager.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_restores_without_network() {
        let store = InMemorySessionStore::new();
        store.save(&stored_session(Role::Employee)).await.unwrap();
        let manager = SessionManager::new(store, MockGateway::rejecting("unused"));

        assert!(manager.is_loading());
        manager.initialize().await;

        assert!(manager.is_authenticated());
        assert_eq!(manager.session(), Some(stored_session(Role::Employee)));
        assert_eq!(manager.gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_empty_store() {
        let manager = SessionManager::new(InMemorySessionStore::new(), MockGateway::rejecting("x"));
        manager.initialize().await;

        assert_eq!(manager.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_initialize_discards_partial_state() {
        let store = InMemorySessionStore::new();
        store.insert_raw(TOKEN_KEY, "tok_orphan");
        let manager = SessionManager::new(store.clone(), MockGateway::rejecting("x"));

        manager.initialize().await;

        assert_eq!(manager.state(), SessionState::Unauthenticated);
        assert!(store.entry(TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_initialize_discards_unparseable_state() {
        let store = InMemorySessionStore::new();
        store.insert_raw(TOKEN_KEY, "tok");
        store.insert_raw(SESSION_KEY, "{{{");
        let manager = SessionManager::new(store.clone(), MockGateway::rejecting("x"));

        manager.initialize().await;

        assert!(!manager.is_authenticated());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store.clone(), MockGateway::rejecting("x"));
        manager.initialize().await;

        // a session appearing later is not picked up by a second call
        store.save(&stored_session(Role::Admin)).await.unwrap();
        manager.initialize().await;

        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_before_initialize_is_kept() {
        let store = InMemorySessionStore::new();
        let manager = SessionManager::new(store, MockGateway::accepting("admin"));

        manager.login("ada@example.com", "pw").await.unwrap();
        manager.initialize().await;

        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_reader_tracks_manager() {
        let manager = SessionManager::new(InMemorySessionStore::new(), MockGateway::accepting("admin"));
        let reader = manager.reader();

        assert!(reader.is_loading());
        assert!(reader.bearer_token().is_none());

        manager.initialize().await;
        assert!(!reader.is_loading());
        assert!(!reader.is_authenticated());

        manager.login("ada@example.com", "pw").await.unwrap();
        assert!(reader.is_authenticated());
        assert_eq!(reader.bearer_token().unwrap().expose_secret(), "tok_ada");

        manager.logout().await;
        assert!(reader.bearer_token().is_none());
    }

    #[tokio::test]
    async fn test_reader_ready_waits_for_initialize() {
        let store = InMemorySessionStore::new();
        store.save(&stored_session(Role::Admin)).await.unwrap();
        let manager = Arc::new(SessionManager::new(store, MockGateway::rejecting("x")));
        let reader = manager.reader();

        let waiter = tokio::spawn(async move { reader.ready().await });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        manager.initialize().await;
        let state = waiter.await.unwrap();
        assert_eq!(state.session().map(|s| s.role), Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_reader_ready_after_manager_dropped() {
        let manager = SessionManager::new(InMemorySessionStore::new(), MockGateway::rejecting("x"));
        let reader = manager.reader();
        drop(manager);

        assert_eq!(reader.ready().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_events_emitted() {
        use crate::events::Listener;

        struct Names(Arc<Mutex<Vec<&'static str>>>);

        #[async_trait]
        impl Listener for Names {
            async fn handle(&self, event: &SessionEvent) {
                self.0.lock().unwrap().push(event.name());
            }
        }

        let names = Arc::new(Mutex::new(Vec::new()));
        let mut registry = EventRegistry::new();
        registry.listen(Names(Arc::clone(&names)));

        let manager = SessionManager::new(InMemorySessionStore::new(), MockGateway::accepting("admin"))
            .with_events(Arc::new(registry));

        manager.login("", "pw").await.unwrap_err();
        manager.login("ada@example.com", "pw").await.unwrap();
        manager.logout().await;

        assert_eq!(
            *names.lock().unwrap(),
            vec![
                "session.login.failed",
                "session.login.succeeded",
                "session.logged_out"
            ]
        );
    }
}
