//! Per-navigation access decisions.

use crate::manager::SessionReader;
use crate::session::{Role, SessionState};

/// Path of the login view.
pub const LOGIN_PATH: &str = "/login";

/// Result of checking one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Initialization is still running; show a loading indicator and do
    /// not redirect yet.
    Pending,
    /// No session. `from` is the location that was requested so a login
    /// flow can return to it.
    RedirectToLogin { from: String },
    /// The session's role may not see the target; go to the role's home.
    RedirectHome { to: &'static str },
    Render,
}

impl GuardOutcome {
    /// Where the navigation should go instead, if anywhere.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::RedirectHome { to } => Some(to),
            Self::Pending | Self::Render => None,
        }
    }
}

/// Decides whether `target` may render for the given state.
///
/// `roles` of `None` means any authenticated user may see the target. An
/// empty slice permits nobody, so every session is sent home.
pub fn evaluate(state: &SessionState, target: &str, roles: Option<&[Role]>) -> GuardOutcome {
    let session = match state {
        SessionState::Pending => return GuardOutcome::Pending,
        SessionState::Unauthenticated => {
            return GuardOutcome::RedirectToLogin {
                from: target.to_owned(),
            };
        }
        SessionState::Authenticated(session) => session,
    };

    match roles {
        Some(permitted) if !permitted.contains(&session.role) => GuardOutcome::RedirectHome {
            to: session.role.home_path(),
        },
        _ => GuardOutcome::Render,
    }
}

/// Guard bound to the live session state.
///
/// Holds no state of its own; each [`check`](RouteGuard::check) reads the
/// current session.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionReader,
}

impl RouteGuard {
    pub fn new(session: SessionReader) -> Self {
        Self { session }
    }

    pub fn check(&self, target: &str, roles: Option<&[Role]>) -> GuardOutcome {
        let outcome = evaluate(&self.session.state(), target, roles);
        tracing::trace!(target_path = target, ?outcome, "route guard");
        outcome
    }

    /// Like [`check`](RouteGuard::check), but waits out initialization
    /// instead of answering `Pending`.
    pub async fn check_when_ready(&self, target: &str, roles: Option<&[Role]>) -> GuardOutcome {
        let state = self.session.ready().await;
        evaluate(&state, target, roles)
    }
}
