//! Route guard - gates protected pages on the auth state
//!
//! ```text
//! Checking --identity--> Authorized
//!    |                       |
//!    +------no identity------+--> Unauthorized (one redirect to /login)
//! ```
//! Every state is left again when the auth state changes.

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::PrivilegeKey;
use crate::services::auth::AuthState;
use crate::services::navigation::{can_access, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuardState {
    /// Auth state still loading
    Checking,
    Authorized,
    Unauthorized,
}

impl GuardState {
    pub fn of(auth: &AuthState) -> Self {
        if auth.loading {
            GuardState::Checking
        } else if auth.identity.is_some() {
            GuardState::Authorized
        } else {
            GuardState::Unauthorized
        }
    }
}

/// What the page should do after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show a placeholder, do nothing else
    Placeholder,
    Render,
    /// Signed in, but the route's privilege is not granted
    Forbidden(PrivilegeKey),
    /// Navigate to the given route. Emitted once per entry into `Unauthorized`.
    Redirect(Route),
    /// Still unauthorized; the redirect was already emitted
    Blocked,
}

pub struct RouteGuard {
    route: Route,
    state: Option<GuardState>,
    redirects: usize,
}

impl RouteGuard {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            state: None,
            redirects: 0,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Last observed state, `None` before the first observation
    pub fn state(&self) -> Option<GuardState> {
        self.state
    }

    /// Number of redirects emitted so far
    pub fn redirects(&self) -> usize {
        self.redirects
    }

    pub fn observe(&mut self, auth: &AuthState) -> GuardDecision {
        if !self.route.is_protected() {
            return GuardDecision::Render;
        }

        let next = GuardState::of(auth);
        let previous = self.state.replace(next);

        match next {
            GuardState::Checking => GuardDecision::Placeholder,
            GuardState::Authorized => match self.route.required_privilege() {
                Some(key) if !can_access(self.route, auth.privileges.as_ref()) => {
                    GuardDecision::Forbidden(key)
                }
                _ => GuardDecision::Render,
            },
            GuardState::Unauthorized if previous == Some(GuardState::Unauthorized) => {
                GuardDecision::Blocked
            }
            GuardState::Unauthorized => {
                self.redirects += 1;
                GuardDecision::Redirect(Route::Login)
            }
        }
    }

    /// Observe `rx` until the guard leaves `Checking`.
    ///
    /// Returns `Placeholder` only if the auth context goes away while loading.
    pub async fn settle(&mut self, rx: &mut watch::Receiver<AuthState>) -> GuardDecision {
        loop {
            let auth = rx.borrow_and_update().clone();
            let decision = self.observe(&auth);
            if decision != GuardDecision::Placeholder {
                return decision;
            }
            if rx.changed().await.is_err() {
                return decision;
            }
        }
    }
}
