//! ============================================================================
//! Session Module - Who is signed in, and with what role
//! ============================================================================
//! The session store is the one piece of state shared across views. It has a
//! single owner (the `AuthService`) and is handed out by `Arc` to anything
//! that needs to read it. Writes are last-writer-wins.
//!
//! ## Lifecycle
//! - **Loading**: startup, before the stored token has been checked
//! - **Anonymous**: no token, a failed `/auth/me/`, logout, or any 401
//! - **Authenticated**: after login or a successful `/auth/me/`
//! ============================================================================

mod token_store;

pub use token_store::{MemoryTokenStore, RedbTokenStore, TokenStore, REFRESH_KEY, TOKEN_KEY};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::{KycStatus, Role, User};

/// Authenticated user snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub role: Role,
    pub kyc_status: Option<KycStatus>,
}

impl Session {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }

    pub fn is_kyc_blocked(&self) -> bool {
        matches!(
            self.kyc_status,
            Some(KycStatus::Pending) | Some(KycStatus::Rejected)
        )
    }
}

/// Session state as seen by the route guard
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.role)
    }
}

/// Shared, injectable holder of the current session
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    /// New store in the `Loading` state
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts already resolved
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Current state (cloned)
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current(&self) -> Option<Session> {
        self.state.read().await.session().cloned()
    }

    pub async fn set_session(&self, session: Session) {
        info!(
            "Session active for {} ({})",
            session.user.username, session.role
        );
        *self.state.write().await = SessionState::Authenticated(session);
    }

    /// Drop the user and mark the session anonymous
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        if state.is_authenticated() {
            debug!("Clearing session");
        }
        *state = SessionState::Anonymous;
    }

    /// Leave `Loading` without a user
    pub async fn mark_anonymous(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, SessionState::Loading) {
            *state = SessionState::Anonymous;
        }
    }

    /// Local KYC override after the user sees a status change
    pub async fn update_kyc_status(&self, status: Option<KycStatus>) {
        let mut state = self.state.write().await;
        if let SessionState::Authenticated(session) = &mut *state {
            session.kyc_status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(role: Role) -> Session {
        Session {
            user: User {
                id: 1,
                username: "rajesh".into(),
                email: "rajesh@example.com".into(),
            },
            role,
            kyc_status: Some(KycStatus::Approved),
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let store = SessionStore::new();
        assert_eq!(store.snapshot().await, SessionState::Loading);

        store.set_session(sample_session(Role::Farmer)).await;
        assert_eq!(store.snapshot().await.role(), Some(Role::Farmer));

        store.clear().await;
        assert_eq!(store.snapshot().await, SessionState::Anonymous);
        assert!(store.current().await.is_none());
    }

    #[tokio::test]
    async fn test_mark_anonymous_only_from_loading() {
        let store = SessionStore::with_state(SessionState::Authenticated(sample_session(Role::Admin)));
        store.mark_anonymous().await;
        assert!(store.snapshot().await.is_authenticated());

        let fresh = SessionStore::new();
        fresh.mark_anonymous().await;
        assert_eq!(fresh.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = SessionStore::new();
        let handle = store.clone();
        handle.set_session(sample_session(Role::Retailer)).await;
        assert_eq!(store.snapshot().await.role(), Some(Role::Retailer));

        store.update_kyc_status(Some(KycStatus::Rejected)).await;
        assert!(handle.current().await.unwrap().is_kyc_blocked());
    }
}
