//! ============================================================================
//! Endpoints - One typed method per backend operation
//! ============================================================================
//! Thin wrappers over `ApiClient`'s verbs. Paths are relative to the API base
//! URL and keep Django's trailing slash.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::info;

use super::client::ApiClient;
use crate::error::ApiError;
use crate::forms::{BatchRequest, BulkSplitRequest, InspectionDraft, ListingRequest, RegistrationRequest};
use crate::types::{
    AdminStats, Batch, BatchSplit, InspectionRecord, KycRecord, KycStatus, ManagedUser, RetailListing,
    Role, StakeholderProfile, TraceReport, TransportRequest, User,
};

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Email or username; the backend tries both
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub refresh: String,
    pub user: User,
    pub role: Role,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub user: User,
    pub role: Role,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

/// `{success, message}` envelope of the action endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KycSubmission {
    pub profile: i64,
    pub document_type: String,
    pub document_number: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer_base_price_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransportRequest {
    pub batch: i64,
    pub to_party: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vehicle_details: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub driver_details: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransportUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_for_sale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retailer_margin: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBatchSplit {
    pub parent_batch: i64,
    pub split_label: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_retailer: Option<i64>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumerScan {
    pub listing: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerScanRecord {
    pub id: i64,
    pub listing: i64,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KycDecisionResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub kyc: Option<KycRecord>,
}

/// Filter for `/stakeholders/`
#[derive(Debug, Clone, Copy, Default)]
pub struct StakeholderQuery {
    pub role: Option<Role>,
    pub kyc_status: Option<KycStatus>,
}

impl StakeholderQuery {
    /// Approved stakeholders of one role (picker lists)
    pub fn approved(role: Role) -> Self {
        Self {
            role: Some(role),
            kyc_status: Some(KycStatus::Approved),
        }
    }

    fn to_query(self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(role) = self.role {
            query.push(("role".to_string(), role.slug().to_string()));
        }
        if let Some(status) = self.kyc_status {
            query.push(("kyc_status".to_string(), status.decision_value().to_string()));
        }
        query
    }
}

// ============================================================================
// Auth
// ============================================================================

impl ApiClient {
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post("/auth/login/", request).await
    }

    pub async fn register(&self, request: &RegistrationRequest) -> Result<RegisterResponse, ApiError> {
        self.post("/auth/register/", request).await
    }

    pub async fn me(&self) -> Result<MeResponse, ApiError> {
        self.get("/auth/me/").await
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<MessageResponse, ApiError> {
        self.patch("/auth/me/", update).await
    }

    pub async fn logout(&self, refresh: &str) -> Result<MessageResponse, ApiError> {
        self.post("/auth/logout/", &serde_json::json!({ "refresh": refresh })).await
    }
}

// ============================================================================
// Stakeholders & KYC
// ============================================================================

impl ApiClient {
    pub async fn stakeholder(&self, id: i64) -> Result<StakeholderProfile, ApiError> {
        self.get(&format!("/stakeholders/{}/", id)).await
    }

    pub async fn update_stakeholder(&self, id: i64, update: &ProfileUpdate) -> Result<StakeholderProfile, ApiError> {
        self.patch(&format!("/stakeholders/{}/", id), update).await
    }

    pub async fn stakeholders(&self, query: StakeholderQuery) -> Result<Vec<StakeholderProfile>, ApiError> {
        self.get_list("/stakeholders/", query.to_query()).await
    }

    pub async fn kyc_records(&self) -> Result<Vec<KycRecord>, ApiError> {
        self.get_list("/kyc-records/", Vec::new()).await
    }

    pub async fn submit_kyc(&self, submission: &KycSubmission) -> Result<KycRecord, ApiError> {
        info!("Submitting KYC {} for profile {}", submission.document_type, submission.profile);
        self.post("/kyc-records/", submission).await
    }

    pub async fn update_kyc_record(&self, id: i64, status: KycStatus) -> Result<KycRecord, ApiError> {
        self.patch(
            &format!("/kyc-records/{}/", id),
            &serde_json::json!({ "status": status.decision_value() }),
        )
        .await
    }
}

// ============================================================================
// Crop Batches
// ============================================================================

impl ApiClient {
    pub async fn batches(&self) -> Result<Vec<Batch>, ApiError> {
        self.get_list("/crop-batches/", Vec::new()).await
    }

    pub async fn batch(&self, id: i64) -> Result<Batch, ApiError> {
        self.get(&format!("/crop-batches/{}/", id)).await
    }

    pub async fn create_batch(&self, request: &BatchRequest) -> Result<Batch, ApiError> {
        info!("Creating batch: {} {} kg", request.crop_type, request.quantity);
        self.post("/crop-batches/", request).await
    }

    pub async fn update_batch(&self, id: i64, update: &BatchUpdate) -> Result<Batch, ApiError> {
        self.patch(&format!("/crop-batches/{}/", id), update).await
    }

    pub async fn bulk_split(&self, id: i64, request: &BulkSplitRequest) -> Result<MessageResponse, ApiError> {
        info!("Splitting batch {} into {} parts", id, request.splits.len());
        self.post(&format!("/crop-batches/{}/bulk-split/", id), request).await
    }

    pub async fn suspend_batch(&self, id: i64) -> Result<MessageResponse, ApiError> {
        info!("Suspending batch {}", id);
        self.post_empty(&format!("/crop-batches/{}/suspend/", id)).await
    }
}

// ============================================================================
// Transport
// ============================================================================

impl ApiClient {
    pub async fn transport_requests(&self) -> Result<Vec<TransportRequest>, ApiError> {
        self.get_list("/transport-requests/", Vec::new()).await
    }

    pub async fn transport_request(&self, id: i64) -> Result<TransportRequest, ApiError> {
        self.get(&format!("/transport-requests/{}/", id)).await
    }

    pub async fn create_transport_request(&self, request: &NewTransportRequest) -> Result<TransportRequest, ApiError> {
        self.post("/transport-requests/", request).await
    }

    pub async fn update_transport_request(&self, id: i64, update: &TransportUpdate) -> Result<TransportRequest, ApiError> {
        self.patch(&format!("/transport-requests/{}/", id), update).await
    }

    /// Farmer asks for pickup to a distributor
    pub async fn request_transport(&self, batch_id: i64, distributor_id: i64) -> Result<MessageResponse, ApiError> {
        info!("Requesting transport of batch {} to distributor {}", batch_id, distributor_id);
        self.post(
            "/transport/request/",
            &serde_json::json!({ "batch_id": batch_id, "distributor_id": distributor_id }),
        )
        .await
    }

    pub async fn accept_transport(&self, id: i64, fee_per_unit: f64) -> Result<MessageResponse, ApiError> {
        info!("Accepting transport request {} at {}/unit", id, fee_per_unit);
        self.post(
            &format!("/transport/{}/accept/", id),
            &serde_json::json!({ "transporter_fee_per_unit": fee_per_unit }),
        )
        .await
    }

    pub async fn arrive_transport(&self, id: i64) -> Result<MessageResponse, ApiError> {
        info!("Marking transport request {} arrived", id);
        self.post_empty(&format!("/transport/{}/arrive/", id)).await
    }

    /// Receiver confirms the shipment arrived
    pub async fn confirm_arrival(&self, id: i64) -> Result<MessageResponse, ApiError> {
        info!("Confirming arrival for transport request {}", id);
        self.post_empty(&format!("/transport/{}/confirm-arrival/", id)).await
    }

    pub async fn deliver_transport(&self, id: i64) -> Result<MessageResponse, ApiError> {
        info!("Marking transport request {} delivered", id);
        self.post_empty(&format!("/transport/{}/deliver/", id)).await
    }

    pub async fn reject_transport(&self, id: i64) -> Result<MessageResponse, ApiError> {
        info!("Rejecting transport request {}", id);
        self.post_empty(&format!("/transport/{}/reject/", id)).await
    }
}

// ============================================================================
// Inspections
// ============================================================================

impl ApiClient {
    pub async fn inspections(&self) -> Result<Vec<InspectionRecord>, ApiError> {
        self.get_list("/inspection-reports/", Vec::new()).await
    }

    pub async fn inspection(&self, id: i64) -> Result<InspectionRecord, ApiError> {
        self.get(&format!("/inspection-reports/{}/", id)).await
    }

    pub async fn inspection_timeline(&self, batch_id: i64) -> Result<Vec<InspectionRecord>, ApiError> {
        self.get_list(&format!("/inspection-reports/timeline/{}/", batch_id), Vec::new())
            .await
    }

    /// Multipart upload of an inspection report
    pub async fn create_inspection(&self, draft: &InspectionDraft) -> Result<InspectionRecord, ApiError> {
        let form = draft.to_multipart().await?;
        info!("Filing {} inspection for batch {}: {}", draft.stage, draft.batch, draft.result.as_str());
        self.post_multipart("/inspection-reports/", form).await
    }
}

// ============================================================================
// Retail, Splits, Consumer
// ============================================================================

impl ApiClient {
    pub async fn listings(&self) -> Result<Vec<RetailListing>, ApiError> {
        self.get_list("/retail-listings/", Vec::new()).await
    }

    pub async fn listing(&self, id: i64) -> Result<RetailListing, ApiError> {
        self.get(&format!("/retail-listings/{}/", id)).await
    }

    pub async fn create_listing(&self, request: &ListingRequest) -> Result<RetailListing, ApiError> {
        info!("Listing batch {} for sale", request.batch);
        self.post("/retail-listings/", request).await
    }

    pub async fn update_listing(&self, id: i64, update: &ListingUpdate) -> Result<RetailListing, ApiError> {
        self.patch(&format!("/retail-listings/{}/", id), update).await
    }

    pub async fn batch_splits(&self) -> Result<Vec<BatchSplit>, ApiError> {
        self.get_list("/batch-splits/", Vec::new()).await
    }

    pub async fn batch_split(&self, id: i64) -> Result<BatchSplit, ApiError> {
        self.get(&format!("/batch-splits/{}/", id)).await
    }

    pub async fn create_batch_split(&self, split: &NewBatchSplit) -> Result<BatchSplit, ApiError> {
        self.post("/batch-splits/", split).await
    }

    pub async fn record_scan(&self, scan: &ConsumerScan) -> Result<ConsumerScanRecord, ApiError> {
        self.post("/consumer-scans/", scan).await
    }

    /// Public lookup; works without a session
    pub async fn trace(&self, public_id: &str) -> Result<TraceReport, ApiError> {
        self.get(&format!("/public/trace/{}/", public_id.trim())).await
    }
}

// ============================================================================
// Distributor & Retailer Actions
// ============================================================================

impl ApiClient {
    pub async fn store_batch(&self, batch_id: i64, margin_per_unit: f64) -> Result<MessageResponse, ApiError> {
        info!("Storing batch {} with margin {}/unit", batch_id, margin_per_unit);
        self.post(
            &format!("/distributor/batch/{}/store/", batch_id),
            &serde_json::json!({ "distributor_margin_per_unit": margin_per_unit }),
        )
        .await
    }

    pub async fn request_transport_to_retailer(
        &self,
        batch_id: i64,
        retailer_id: i64,
    ) -> Result<MessageResponse, ApiError> {
        info!("Requesting transport of batch {} to retailer {}", batch_id, retailer_id);
        self.post(
            "/distributor/transport/request-to-retailer/",
            &serde_json::json!({ "batch_id": batch_id, "retailer_id": retailer_id }),
        )
        .await
    }

    /// Sell part or all of a listed batch; `None` sells everything left
    pub async fn mark_sold(&self, batch_id: i64, sold_quantity: Option<f64>) -> Result<MessageResponse, ApiError> {
        info!("Marking batch {} sold ({:?} kg)", batch_id, sold_quantity);
        let path = format!("/retailer/batch/{}/mark-sold/", batch_id);
        match sold_quantity {
            Some(quantity) => self.post(&path, &serde_json::json!({ "sold_quantity": quantity })).await,
            None => self.post_empty(&path).await,
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

impl ApiClient {
    pub async fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get("/admin/stats/").await
    }

    pub async fn pending_kyc(&self) -> Result<Vec<KycRecord>, ApiError> {
        self.get_list("/admin/kyc/pending/", Vec::new()).await
    }

    pub async fn all_kyc(&self, status: Option<KycStatus>) -> Result<Vec<KycRecord>, ApiError> {
        let query = status
            .map(|s| vec![("status".to_string(), s.decision_value().to_string())])
            .unwrap_or_default();
        self.get_list("/admin/kyc/all/", query).await
    }

    pub async fn decide_kyc(&self, id: i64, decision: KycStatus, notes: &str) -> Result<KycDecisionResponse, ApiError> {
        info!("KYC {} -> {}", id, decision.decision_value());
        self.post(
            &format!("/admin/kyc/decide/{}/", id),
            &serde_json::json!({ "decision": decision.decision_value(), "notes": notes }),
        )
        .await
    }

    pub async fn admin_users(&self, role: Option<Role>) -> Result<Vec<ManagedUser>, ApiError> {
        let query = role
            .map(|r| vec![("role".to_string(), r.slug().to_string())])
            .unwrap_or_default();
        self.get_list("/admin/users/", query).await
    }

    pub async fn admin_user(&self, id: i64) -> Result<ManagedUser, ApiError> {
        self.get(&format!("/admin/users/{}/", id)).await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<ManagedUser, ApiError> {
        info!("Updating user {}", id);
        self.patch(&format!("/admin/users/{}/", id), update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::forms::{SplitDraft, SplitPolicy, SplitRow};
    use crate::test_support::{sample_batch, TestHarness};
    use crate::types::{BatchStatus, InspectionResult, InspectionStage};
    use serde_json::json;

    #[tokio::test]
    async fn test_login_sends_identifier_as_email() {
        let harness = TestHarness::anonymous();
        harness.transport.respond(
            Method::Post,
            "/auth/login/",
            200,
            r#"{"token": "t", "refresh": "r", "user": {"id": 1, "username": "asha", "email": "a@x.in"},
                "role": "FARMER", "kyc_status": "APPROVED"}"#,
        );

        let response = harness
            .client
            .login(&LoginRequest {
                email: "asha".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.role, Role::Farmer);
        assert_eq!(response.kyc_status, Some(KycStatus::Approved));

        let sent = harness.transport.requests();
        assert_eq!(sent[0].json(), Some(&json!({"email": "asha", "password": "secret"})));
        assert!(sent[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_bulk_split_payload() {
        let harness = TestHarness::signed_in(Role::Distributor);
        harness.transport.respond(
            Method::Post,
            "/crop-batches/5/bulk-split/",
            201,
            r#"{"success": true, "message": "Batch split into 2 child batches"}"#,
        );

        let parent = Batch {
            quantity: 100.0,
            ..sample_batch(5, BatchStatus::Stored)
        };
        let request = SplitDraft::new(&parent, SplitPolicy::ExactMatch)
            .with_rows(vec![SplitRow::new("A", "60"), SplitRow::new("B", "40")])
            .validate()
            .unwrap();

        let response = harness.client.bulk_split(5, &request).await.unwrap();
        assert_eq!(response.success, Some(true));

        let body = harness.transport.requests()[0].json().cloned().unwrap();
        assert_eq!(body["splits"][0], json!({"label": "A", "quantity": 60.0, "notes": "Split from PB-0005"}));
    }

    #[tokio::test]
    async fn test_stakeholder_query_is_lowercase() {
        let harness = TestHarness::signed_in(Role::Distributor);
        harness.transport.respond(Method::Get, "/stakeholders/", 200, "[]");

        harness
            .client
            .stakeholders(StakeholderQuery::approved(Role::Retailer))
            .await
            .unwrap();

        let sent = harness.transport.requests();
        assert_eq!(
            sent[0].query,
            vec![
                ("role".to_string(), "retailer".to_string()),
                ("kyc_status".to_string(), "approved".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_mark_sold_with_and_without_quantity() {
        let harness = TestHarness::signed_in(Role::Retailer);
        harness.transport.respond(Method::Post, "/retailer/batch/8/mark-sold/", 200, r#"{"message": "ok"}"#);
        harness.transport.respond(Method::Post, "/retailer/batch/8/mark-sold/", 200, r#"{"message": "ok"}"#);

        harness.client.mark_sold(8, Some(12.5)).await.unwrap();
        harness.client.mark_sold(8, None).await.unwrap();

        let sent = harness.transport.requests();
        assert_eq!(sent[0].json(), Some(&json!({"sold_quantity": 12.5})));
        assert_eq!(sent[1].json(), None);
    }

    #[tokio::test]
    async fn test_kyc_decision_is_lowercase() {
        let harness = TestHarness::signed_in(Role::Admin);
        harness
            .transport
            .respond(Method::Post, "/admin/kyc/decide/3/", 200, r#"{"message": "KYC approved successfully"}"#);

        let response = harness
            .client
            .decide_kyc(3, KycStatus::Approved, "documents verified")
            .await
            .unwrap();
        assert_eq!(response.message, "KYC approved successfully");
        assert_eq!(
            harness.transport.requests()[0].json(),
            Some(&json!({"decision": "approved", "notes": "documents verified"}))
        );
    }

    #[tokio::test]
    async fn test_inspection_is_multipart() {
        let harness = TestHarness::signed_in(Role::Distributor);
        harness.transport.respond(
            Method::Post,
            "/inspection-reports/",
            201,
            r#"{"id": 11, "batch": 4, "stage": "distributor", "result": "WARNING"}"#,
        );

        let mut draft = InspectionDraft::for_role(4, Role::Distributor).unwrap();
        draft.result = InspectionResult::Warning;
        draft.notes = "Minor bruising".into();

        let record = harness.client.create_inspection(&draft).await.unwrap();
        assert_eq!(record.stage, InspectionStage::Distributor);

        match &harness.transport.requests()[0].body {
            crate::api::RequestBody::Multipart(form) => {
                assert_eq!(form.field("batch"), Some("4"));
                assert_eq!(form.field("stage"), Some("distributor"));
                assert_eq!(form.field("result"), Some("WARNING"));
                assert_eq!(form.field("inspection_notes"), Some("Minor bruising"));
                assert!(form.files.is_empty());
            }
            other => panic!("expected multipart, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trace_is_public() {
        let harness = TestHarness::anonymous();
        harness.transport.respond(
            Method::Get,
            "/public/trace/PUB-77/",
            200,
            r#"{"success": true,
                "batch": {"id": "PUB-77", "crop_type": "Tomato", "quantity": "120.00", "status": "LISTED"},
                "farmer": {"name": "Ravi", "organization": "Green Farms"},
                "timeline": []}"#,
        );

        let report = harness.client.trace(" PUB-77 ").await.unwrap();
        assert_eq!(report.batch.quantity, 120.0);
        assert_eq!(report.batch.status, BatchStatus::Listed);
    }
}
