//! ============================================================================
//! Auth Service - Login, logout, and session bootstrap
//! ============================================================================
//! Sole writer of the session store. Views read the session; only this
//! service (and the API client on a 401) changes it.
//!
//! ## Startup
//! `bootstrap()` ends the `Loading` state exactly once: with a user when the
//! stored token still resolves through `/auth/me/`, anonymous otherwise.
//! ============================================================================

use tracing::{info, warn};

use crate::api::{ApiClient, LoginRequest, MeResponse};
use crate::error::{ApiError, ValidationError};
use crate::forms::RegistrationDraft;
use crate::session::{Session, SessionState, TOKEN_KEY};
use crate::types::{KycStatus, Role};

/// Where a freshly signed-in user should land, given their KYC state
pub fn landing_path(role: Role, kyc_status: Option<KycStatus>) -> String {
    match kyc_status {
        Some(KycStatus::Pending) => "/kyc-pending".to_string(),
        Some(KycStatus::Rejected) => "/kyc-rejected".to_string(),
        _ => role.dashboard_path(),
    }
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Resolve the stored token into a session
    pub async fn bootstrap(&self) -> SessionState {
        let token = self.client.tokens().access_token().unwrap_or_else(|e| {
            warn!("Failed to read stored token: {}", e);
            None
        });

        if token.is_some() {
            match self.client.me().await {
                Ok(me) => self.client.session().set_session(session_from(me)).await,
                Err(e) => {
                    warn!("Stored token rejected: {}", e);
                    if let Err(e) = self.client.tokens().remove(TOKEN_KEY) {
                        warn!("Failed to remove stored token: {}", e);
                    }
                    self.client.session().clear().await;
                }
            }
        }

        self.client.session().mark_anonymous().await;
        self.client.session().snapshot().await
    }

    /// Sign in and navigate to the role dashboard. Returns that path.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<String, ApiError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(ValidationError::RequiredFields.into());
        }

        let response = self
            .client
            .login(&LoginRequest {
                email: identifier.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.client
            .tokens()
            .store_tokens(&response.token, &response.refresh)
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        let target = response.role.dashboard_path();
        info!("Logged in as {} ({})", response.user.username, response.role);

        self.client
            .session()
            .set_session(Session {
                user: response.user,
                role: response.role,
                kyc_status: response.kyc_status,
            })
            .await;

        self.client.navigator().navigate(&target);
        Ok(target)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, draft: &RegistrationDraft) -> Result<String, ApiError> {
        let request = draft.validate()?;
        info!("Registering {} as {}", request.username, request.role);
        let response = self.client.register(&request).await?;
        Ok(response.message)
    }

    /// Blacklist the refresh token (best effort) and drop local state
    pub async fn logout(&self) {
        let refresh = self.client.tokens().refresh_token().unwrap_or_else(|e| {
            warn!("Failed to read refresh token: {}", e);
            None
        });

        if let Some(refresh) = refresh {
            if let Err(e) = self.client.logout(&refresh).await {
                warn!("Logout request failed: {}", e);
            }
        }

        if let Err(e) = self.client.tokens().clear_tokens() {
            warn!("Failed to clear stored tokens: {}", e);
        }
        self.client.session().clear().await;
        info!("Logged out");
    }

    /// Re-fetch the current user; failures leave the session as it was
    pub async fn refresh_user(&self) -> Option<Session> {
        match self.client.me().await {
            Ok(me) => {
                let session = session_from(me);
                self.client.session().set_session(session.clone()).await;
                Some(session)
            }
            Err(e) => {
                warn!("Failed to refresh user: {}", e);
                None
            }
        }
    }

    pub async fn update_kyc_status(&self, status: Option<KycStatus>) {
        self.client.session().update_kyc_status(status).await;
    }
}

fn session_from(me: MeResponse) -> Session {
    Session {
        user: me.user,
        role: me.role,
        kyc_status: me.kyc_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::session::{MemoryTokenStore, TokenStore};
    use crate::test_support::{sample_session, TestHarness};
    use std::sync::Arc;

    const ME_BODY: &str = r#"{"user": {"id": 1, "username": "rajesh", "email": "rajesh@example.com"},
        "role": "DISTRIBUTOR", "kyc_status": "APPROVED"}"#;

    fn loading_with_token() -> TestHarness {
        TestHarness::new(Arc::new(MemoryTokenStore::with_token("stored")), SessionState::Loading)
    }

    #[test]
    fn test_landing_path() {
        assert_eq!(landing_path(Role::Farmer, Some(KycStatus::Approved)), "/farmer/dashboard");
        assert_eq!(landing_path(Role::Farmer, Some(KycStatus::Pending)), "/kyc-pending");
        assert_eq!(landing_path(Role::Retailer, Some(KycStatus::Rejected)), "/kyc-rejected");
        assert_eq!(landing_path(Role::Consumer, None), "/consumer/dashboard");
    }

    #[tokio::test]
    async fn test_bootstrap_with_valid_token() {
        let harness = loading_with_token();
        harness.transport.respond(Method::Get, "/auth/me/", 200, ME_BODY);

        let auth = AuthService::new(harness.client.clone());
        let state = auth.bootstrap().await;
        assert_eq!(state, SessionState::Authenticated(sample_session(Role::Distributor)));
        assert_eq!(harness.transport.requests()[0].bearer.as_deref(), Some("stored"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_drops_token() {
        let harness = loading_with_token();
        harness
            .transport
            .respond(Method::Get, "/auth/me/", 500, r#"{"detail": "server error"}"#);

        let auth = AuthService::new(harness.client.clone());
        assert_eq!(auth.bootstrap().await, SessionState::Anonymous);
        assert_eq!(harness.tokens.access_token().unwrap(), None);
    }

    #[tokio::test]
    async fn test_bootstrap_without_token() {
        let harness = TestHarness::new(Arc::new(MemoryTokenStore::new()), SessionState::Loading);
        let auth = AuthService::new(harness.client.clone());

        assert_eq!(auth.bootstrap().await, SessionState::Anonymous);
        assert!(harness.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_stores_tokens_and_navigates() {
        let harness = TestHarness::anonymous();
        harness.transport.respond(
            Method::Post,
            "/auth/login/",
            200,
            r#"{"token": "access-9", "refresh": "refresh-9",
                "user": {"id": 1, "username": "rajesh", "email": "rajesh@example.com"},
                "role": "RETAILER", "kyc_status": "APPROVED"}"#,
        );

        let auth = AuthService::new(harness.client.clone());
        let target = auth.login("rajesh@example.com", "secret-pass").await.unwrap();

        assert_eq!(target, "/retailer/dashboard");
        assert_eq!(harness.navigator.last().as_deref(), Some("/retailer/dashboard"));
        assert_eq!(harness.tokens.access_token().unwrap().as_deref(), Some("access-9"));
        assert_eq!(harness.tokens.refresh_token().unwrap().as_deref(), Some("refresh-9"));
        assert_eq!(harness.session.current().await, Some(sample_session(Role::Retailer)));
    }

    #[tokio::test]
    async fn test_login_failure_keeps_anonymous() {
        let harness = TestHarness::anonymous();
        harness
            .transport
            .respond(Method::Post, "/auth/login/", 401, r#"{"message": "Invalid credentials"}"#);

        let auth = AuthService::new(harness.client.clone());
        let err = auth.login("rajesh", "wrong").await.unwrap_err();

        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(harness.session.snapshot().await, SessionState::Anonymous);
        assert!(harness.navigator.history().is_empty());

        assert!(matches!(
            auth.login("  ", "x").await,
            Err(ApiError::Validation(ValidationError::RequiredFields))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_request_fails() {
        let harness = TestHarness::signed_in(Role::Farmer);
        // No canned response for /auth/logout/: the request fails
        let auth = AuthService::new(harness.client.clone());
        auth.logout().await;

        let sent = harness.transport.requests();
        assert_eq!(sent[0].path, "/auth/logout/");
        assert_eq!(sent[0].json(), Some(&serde_json::json!({"refresh": "test-refresh"})));
        assert_eq!(harness.tokens.access_token().unwrap(), None);
        assert_eq!(harness.session.snapshot().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_register_validates_first() {
        let harness = TestHarness::anonymous();
        let auth = AuthService::new(harness.client.clone());

        let mut draft = RegistrationDraft::new(Role::Farmer);
        draft.username = "meena".into();
        draft.email = "meena@example.com".into();
        draft.password = "longenough".into();
        draft.confirm_password = "different".into();

        let err = auth.register(&draft).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
        assert!(harness.transport.requests().is_empty());

        draft.confirm_password = "longenough".into();
        harness.transport.respond(
            Method::Post,
            "/auth/register/",
            201,
            r#"{"message": "Registration successful. Please wait for KYC approval."}"#,
        );
        let message = auth.register(&draft).await.unwrap();
        assert!(message.starts_with("Registration successful"));
        assert!(!harness.session.snapshot().await.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_session() {
        let harness = TestHarness::signed_in(Role::Transporter);
        harness
            .transport
            .respond(Method::Get, "/auth/me/", 503, "Service Unavailable");

        let auth = AuthService::new(harness.client.clone());
        assert!(auth.refresh_user().await.is_none());
        assert_eq!(harness.session.current().await, Some(sample_session(Role::Transporter)));

        auth.update_kyc_status(Some(KycStatus::Pending)).await;
        assert!(harness.session.current().await.unwrap().is_kyc_blocked());
    }
}
