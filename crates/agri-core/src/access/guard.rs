//! ============================================================================
//! Route Guard - Render or redirect based on the current session
//! ============================================================================
//! Pure decision over (path, session state). `RouteGuard` wraps it with the
//! shared session store and performs the redirect through a `Navigator`.
//! ============================================================================

use std::sync::Arc;
use tracing::{debug, warn};

use super::navigator::Navigator;
use super::routes::{alias_target, match_route, normalize_path, RouteAccess, RouteMatch};
use crate::session::{SessionState, SessionStore};
use crate::types::Role;

pub const LOGIN_PATH: &str = "/login";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const HOME_PATH: &str = "/";

/// Outcome of guarding a path
#[derive(Debug, Clone, PartialEq)]
pub enum GuardDecision {
    Render(RouteMatch),
    Redirect(String),
    /// Session still loading; show a spinner and ask again
    Pending,
}

impl GuardDecision {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(target) => Some(target),
            _ => None,
        }
    }

    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render(_))
    }
}

fn redirect(target: &str) -> GuardDecision {
    GuardDecision::Redirect(target.to_string())
}

/// Decide what a path renders for the given session state
pub fn decide(path: &str, state: &SessionState) -> GuardDecision {
    if let Some(target) = alias_target(path) {
        return redirect(target);
    }

    // Unknown paths fall through to the landing page
    let Some(matched) = match_route(path) else {
        debug!("No route for {}, redirecting home", normalize_path(path));
        return redirect(HOME_PATH);
    };

    let access = matched.route.access;
    if access == RouteAccess::Public {
        return GuardDecision::Render(matched);
    }

    let session = match state {
        SessionState::Loading => return GuardDecision::Pending,
        SessionState::Anonymous => {
            return match access {
                RouteAccess::Admin => redirect(ADMIN_LOGIN_PATH),
                _ => redirect(LOGIN_PATH),
            };
        }
        SessionState::Authenticated(session) => session,
    };

    match access {
        RouteAccess::Public | RouteAccess::Authenticated => GuardDecision::Render(matched),
        RouteAccess::Roles(allowed) => {
            if session.has_role(allowed) {
                GuardDecision::Render(matched)
            } else {
                redirect(HOME_PATH)
            }
        }
        RouteAccess::Admin => {
            if session.role == Role::Admin && !session.is_kyc_blocked() {
                GuardDecision::Render(matched)
            } else {
                redirect(ADMIN_LOGIN_PATH)
            }
        }
    }
}

/// Session-aware guard that performs redirects
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    pub fn new(session: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }

    /// Decide without side effects
    pub async fn check(&self, path: &str) -> GuardDecision {
        let state = self.session.snapshot().await;
        decide(path, &state)
    }

    /// Decide and follow any redirect. Returns the route to render, if any.
    pub async fn enforce(&self, path: &str) -> Option<RouteMatch> {
        match self.check(path).await {
            GuardDecision::Render(matched) => Some(matched),
            GuardDecision::Redirect(target) => {
                warn!("Access to {} denied, redirecting to {}", normalize_path(path), target);
                self.navigator.navigate(&target);
                None
            }
            GuardDecision::Pending => None,
        }
    }
}
