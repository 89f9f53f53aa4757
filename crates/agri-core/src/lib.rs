//! ============================================================================
//! AGRI-CORE: AgriChain client shell
//! ============================================================================
//! Everything a stakeholder front end needs besides the pixels:
//! - Session store, token persistence, and the role-aware route guard
//! - Typed REST client for the crop traceability backend
//! - Client-side form checks (batch splits, listings, inspections)
//! - Per-role action tables and list filters for the dashboards
//! ============================================================================

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod session;
pub mod timeline;
pub mod types;
pub mod views;

// Re-export main types for convenience
pub use access::{decide, GuardDecision, Navigator, RouteGuard};
pub use api::{ApiClient, ReqwestTransport};
pub use auth::AuthService;
pub use config::ClientConfig;
pub use error::{ApiError, ValidationError};
pub use session::{MemoryTokenStore, RedbTokenStore, Session, SessionState, SessionStore, TokenStore};
pub use types::*;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::access::RecordingNavigator;
    use crate::api::{ApiClient, ApiRequest, ApiResponse, HttpTransport, Method};
    use crate::error::ApiError;
    use crate::session::{MemoryTokenStore, Session, SessionState, SessionStore, TokenStore};
    use crate::types::{Batch, BatchStatus, KycStatus, Role, User};

    pub fn sample_session(role: Role) -> Session {
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

    pub fn sample_batch(id: i64, status: BatchStatus) -> Batch {
        Batch {
            id,
            farmer: Some(2),
            current_owner: Some(1),
            current_owner_username: Some("rajesh".into()),
            status,
            farm_location: Some("Nashik".into()),
            crop_type: "Wheat".into(),
            quantity: 500.0,
            harvest_date: None,
            product_batch_id: format!("PB-{:04}", id),
            public_batch_id: None,
            created_at: None,
            is_child_batch: false,
            parent_batch: None,
            farmer_base_price_per_unit: Some(20.0),
            distributor_margin_per_unit: None,
            total_transport_fees: None,
        }
    }

    /// Transport that replays canned responses per (method, path) in order
    #[derive(Default)]
    pub struct FakeTransport {
        canned: Mutex<Vec<(Method, String, ApiResponse)>>,
        sent: Mutex<Vec<ApiRequest>>,
    }

    impl FakeTransport {
        pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) {
            self.canned.lock().unwrap().push((
                method,
                path.to_string(),
                ApiResponse {
                    status,
                    body: body.to_string(),
                },
            ));
        }

        pub fn requests(&self) -> Vec<ApiRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
            let mut canned = self.canned.lock().unwrap();
            let position = canned
                .iter()
                .position(|(method, path, _)| *method == request.method && *path == request.path);
            let key = format!("{} {}", request.method.as_str(), request.path);
            self.sent.lock().unwrap().push(request);

            match position {
                Some(index) => Ok(canned.remove(index).2),
                None => Err(ApiError::Network(format!("no canned response for {}", key))),
            }
        }
    }

    pub struct TestHarness {
        pub client: ApiClient,
        pub transport: Arc<FakeTransport>,
        pub tokens: Arc<MemoryTokenStore>,
        pub session: SessionStore,
        pub navigator: Arc<RecordingNavigator>,
    }

    impl TestHarness {
        pub fn new(tokens: Arc<MemoryTokenStore>, state: SessionState) -> Self {
            let transport = Arc::new(FakeTransport::default());
            let session = SessionStore::with_state(state);
            let navigator = Arc::new(RecordingNavigator::new());
            let client = ApiClient::new(transport.clone(), tokens.clone(), session.clone(), navigator.clone());
            Self {
                client,
                transport,
                tokens,
                session,
                navigator,
            }
        }

        pub fn signed_in(role: Role) -> Self {
            let tokens = Arc::new(MemoryTokenStore::new());
            tokens.store_tokens("test-token", "test-refresh").unwrap();
            Self::new(tokens, SessionState::Authenticated(sample_session(role)))
        }

        pub fn anonymous() -> Self {
            Self::new(Arc::new(MemoryTokenStore::new()), SessionState::Anonymous)
        }
    }
}
