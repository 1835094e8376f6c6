//! The application's route table.
//!
//! ```text
//! /           application shell       public
//! /login      login form              public
//! /admin      admin dashboard         admin
//! /employee   employee dashboard      employee
//! ```

use crate::guard::{self, GuardOutcome};
use crate::session::{Role, SessionState};

/// Views the client can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Shell,
    Login,
    AdminHome,
    EmployeeHome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub view: View,
    /// `None` for public routes; otherwise the roles allowed to see it.
    pub roles: Option<&'static [Role]>,
}

impl Route {
    pub fn is_public(&self) -> bool {
        self.roles.is_none()
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Session initialization is still running.
    Pending,
    Render(View),
    /// Go to `to` instead. `from` is set when the original target should be
    /// restored after login.
    Redirect { to: String, from: Option<String> },
    NotFound,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const EMPLOYEE_ONLY: &[Role] = &[Role::Employee];

const ROUTES: &[Route] = &[
    Route {
        path: "/",
        view: View::Shell,
        roles: None,
    },
    Route {
        path: guard::LOGIN_PATH,
        view: View::Login,
        roles: None,
    },
    Route {
        path: "/admin",
        view: View::AdminHome,
        roles: Some(ADMIN_ONLY),
    },
    Route {
        path: "/employee",
        view: View::EmployeeHome,
        roles: Some(EMPLOYEE_ONLY),
    },
];

/// Resolves paths against the route table and applies the route guard.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: &'static [Route],
}

impl Default for RouteTable {
    fn default() -> Self {
        Self { routes: ROUTES }
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        self.routes
    }

    /// Finds the route for `path`, ignoring any query string, fragment and
    /// trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };

        self.routes.iter().find(|route| route.path == normalized)
    }

    /// Decides what happens when the user navigates to `path`.
    pub fn navigate(&self, state: &SessionState, path: &str) -> Navigation {
        let Some(route) = self.resolve(path) else {
            return Navigation::NotFound;
        };

        // public routes render whatever the session state
        let Some(roles) = route.roles else {
            return Navigation::Render(route.view);
        };

        match guard::evaluate(state, path, Some(roles)) {
            GuardOutcome::Pending => Navigation::Pending,
            GuardOutcome::Render => Navigation::Render(route.view),
            GuardOutcome::RedirectToLogin { from } => Navigation::Redirect {
                to: guard::LOGIN_PATH.to_owned(),
                from: Some(from),
            },
            GuardOutcome::RedirectHome { to } => Navigation::Redirect {
                to: to.to_owned(),
                from: None,
            },
        }
    }

    /// Where to send a user right after logging in.
    pub fn landing_path(role: Role) -> &'static str {
        role.home_path()
    }

    /// The navigation bar is only shown to signed-in users.
    pub fn shows_navbar(state: &SessionState) -> bool {
        state.is_authenticated()
    }
}
