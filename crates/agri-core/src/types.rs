//! ============================================================================
//! Core Types - View models mirrored from the AgriChain backend
//! ============================================================================
//! Every record here is owned by the backend. The client only deserializes
//! the last snapshot it fetched and never treats these values as authoritative.
//! Status strings map onto closed enums with an `Unknown` fallback so a new
//! backend state renders instead of failing to parse.
//! ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Roles & KYC
// ============================================================================

/// Stakeholder role. The backend sends upper case on login and lower case
/// on registration, so parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Farmer,
    Distributor,
    Transporter,
    Retailer,
    Consumer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Farmer,
        Role::Distributor,
        Role::Transporter,
        Role::Retailer,
        Role::Consumer,
    ];

    /// Wire form used by login responses and route tables (`FARMER`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Farmer => "FARMER",
            Role::Distributor => "DISTRIBUTOR",
            Role::Transporter => "TRANSPORTER",
            Role::Retailer => "RETAILER",
            Role::Consumer => "CONSUMER",
        }
    }

    /// Lower-case path segment (`farmer`)
    pub fn slug(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Farmer => "farmer",
            Role::Distributor => "distributor",
            Role::Transporter => "transporter",
            Role::Retailer => "retailer",
            Role::Consumer => "consumer",
        }
    }

    /// Human-readable role badge
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Farmer => "Farmer",
            Role::Distributor => "Distributor",
            Role::Transporter => "Transporter",
            Role::Retailer => "Retailer",
            Role::Consumer => "Consumer",
        }
    }

    /// Landing page after login
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.slug())
    }

    /// Inspection stage this role files reports under, if any
    pub fn inspection_stage(&self) -> Option<InspectionStage> {
        match self {
            Role::Farmer => Some(InspectionStage::Farmer),
            Role::Transporter => Some(InspectionStage::Transporter),
            Role::Distributor => Some(InspectionStage::Distributor),
            Role::Retailer => Some(InspectionStage::Retailer),
            Role::Admin | Role::Consumer => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown role '{}'. Valid values: admin, farmer, distributor, transporter, retailer, consumer",
                    s
                )
            })
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// KYC verification state of a stakeholder profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "PENDING",
            KycStatus::Approved => "APPROVED",
            KycStatus::Rejected => "REJECTED",
        }
    }

    /// Lower-case value the admin decision endpoint expects
    pub fn decision_value(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(KycStatus::Pending),
            "APPROVED" => Ok(KycStatus::Approved),
            "REJECTED" => Ok(KycStatus::Rejected),
            _ => Err(format!(
                "Unknown KYC status '{}'. Valid values: pending, approved, rejected",
                s
            )),
        }
    }
}

impl Serialize for KycStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KycStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Pipeline Status Enums
// ============================================================================

/// Batch pipeline state. Transitions are enforced server-side only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchStatus {
    Created,
    TransportRequested,
    InTransitToDistributor,
    ArrivedAtDistributor,
    ArrivalConfirmedByDistributor,
    DeliveredToDistributor,
    Stored,
    TransportRequestedToRetailer,
    InTransitToRetailer,
    ArrivedAtRetailer,
    ArrivalConfirmedByRetailer,
    DeliveredToRetailer,
    Listed,
    Sold,
    TransportRejected,
    Suspended,
    FullySplit,
    /// A status this client does not know yet
    Unknown(String),
}

impl BatchStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Created => "CREATED",
            BatchStatus::TransportRequested => "TRANSPORT_REQUESTED",
            BatchStatus::InTransitToDistributor => "IN_TRANSIT_TO_DISTRIBUTOR",
            BatchStatus::ArrivedAtDistributor => "ARRIVED_AT_DISTRIBUTOR",
            BatchStatus::ArrivalConfirmedByDistributor => "ARRIVAL_CONFIRMED_BY_DISTRIBUTOR",
            BatchStatus::DeliveredToDistributor => "DELIVERED_TO_DISTRIBUTOR",
            BatchStatus::Stored => "STORED",
            BatchStatus::TransportRequestedToRetailer => "TRANSPORT_REQUESTED_TO_RETAILER",
            BatchStatus::InTransitToRetailer => "IN_TRANSIT_TO_RETAILER",
            BatchStatus::ArrivedAtRetailer => "ARRIVED_AT_RETAILER",
            BatchStatus::ArrivalConfirmedByRetailer => "ARRIVAL_CONFIRMED_BY_RETAILER",
            BatchStatus::DeliveredToRetailer => "DELIVERED_TO_RETAILER",
            BatchStatus::Listed => "LISTED",
            BatchStatus::Sold => "SOLD",
            BatchStatus::TransportRejected => "TRANSPORT_REJECTED",
            BatchStatus::Suspended => "SUSPENDED",
            BatchStatus::FullySplit => "FULLY_SPLIT",
            BatchStatus::Unknown(raw) => raw.as_str(),
        }
    }

    /// Badge text: underscores become spaces
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, BatchStatus::Unknown(_))
    }
}

impl From<String> for BatchStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "CREATED" => BatchStatus::Created,
            "TRANSPORT_REQUESTED" => BatchStatus::TransportRequested,
            "IN_TRANSIT_TO_DISTRIBUTOR" => BatchStatus::InTransitToDistributor,
            "ARRIVED_AT_DISTRIBUTOR" => BatchStatus::ArrivedAtDistributor,
            "ARRIVAL_CONFIRMED_BY_DISTRIBUTOR" => BatchStatus::ArrivalConfirmedByDistributor,
            "DELIVERED_TO_DISTRIBUTOR" => BatchStatus::DeliveredToDistributor,
            "STORED" => BatchStatus::Stored,
            "TRANSPORT_REQUESTED_TO_RETAILER" => BatchStatus::TransportRequestedToRetailer,
            "IN_TRANSIT_TO_RETAILER" => BatchStatus::InTransitToRetailer,
            "ARRIVED_AT_RETAILER" => BatchStatus::ArrivedAtRetailer,
            "ARRIVAL_CONFIRMED_BY_RETAILER" => BatchStatus::ArrivalConfirmedByRetailer,
            "DELIVERED_TO_RETAILER" => BatchStatus::DeliveredToRetailer,
            "LISTED" => BatchStatus::Listed,
            "SOLD" => BatchStatus::Sold,
            "TRANSPORT_REJECTED" => BatchStatus::TransportRejected,
            "SUSPENDED" => BatchStatus::Suspended,
            "FULLY_SPLIT" => BatchStatus::FullySplit,
            _ => BatchStatus::Unknown(raw),
        }
    }
}

impl From<BatchStatus> for String {
    fn from(status: BatchStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport leg state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportStatus {
    Pending,
    Accepted,
    InTransit,
    InTransitToRetailer,
    Arrived,
    ArrivalConfirmed,
    Delivered,
    Rejected,
    Unknown(String),
}

impl TransportStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TransportStatus::Pending => "PENDING",
            TransportStatus::Accepted => "ACCEPTED",
            TransportStatus::InTransit => "IN_TRANSIT",
            TransportStatus::InTransitToRetailer => "IN_TRANSIT_TO_RETAILER",
            TransportStatus::Arrived => "ARRIVED",
            TransportStatus::ArrivalConfirmed => "ARRIVAL_CONFIRMED",
            TransportStatus::Delivered => "DELIVERED",
            TransportStatus::Rejected => "REJECTED",
            TransportStatus::Unknown(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl From<String> for TransportStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => TransportStatus::Pending,
            "ACCEPTED" => TransportStatus::Accepted,
            "IN_TRANSIT" => TransportStatus::InTransit,
            "IN_TRANSIT_TO_RETAILER" => TransportStatus::InTransitToRetailer,
            "ARRIVED" => TransportStatus::Arrived,
            "ARRIVAL_CONFIRMED" => TransportStatus::ArrivalConfirmed,
            "DELIVERED" => TransportStatus::Delivered,
            "REJECTED" => TransportStatus::Rejected,
            _ => TransportStatus::Unknown(raw),
        }
    }
}

impl From<TransportStatus> for String {
    fn from(status: TransportStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Inspection Enums
// ============================================================================

/// Supply-chain stage an inspection was filed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InspectionStage {
    Farmer,
    Transporter,
    Distributor,
    Retailer,
}

impl InspectionStage {
    /// Canonical display order
    pub const ALL: [InspectionStage; 4] = [
        InspectionStage::Farmer,
        InspectionStage::Transporter,
        InspectionStage::Distributor,
        InspectionStage::Retailer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStage::Farmer => "farmer",
            InspectionStage::Transporter => "transporter",
            InspectionStage::Distributor => "distributor",
            InspectionStage::Retailer => "retailer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InspectionStage::Farmer => "Farmer",
            InspectionStage::Transporter => "Transporter",
            InspectionStage::Distributor => "Distributor",
            InspectionStage::Retailer => "Retailer",
        }
    }

    /// Default form title for this stage
    pub fn form_title(&self) -> &'static str {
        match self {
            InspectionStage::Farmer => "Farmer Inspection",
            InspectionStage::Transporter => "Transporter Inspection",
            InspectionStage::Distributor => "Distributor Inspection",
            InspectionStage::Retailer => "Retailer Inspection",
        }
    }
}

impl fmt::Display for InspectionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InspectionResult {
    #[default]
    Pass,
    Warning,
    Fail,
}

impl InspectionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionResult::Pass => "PASS",
            InspectionResult::Warning => "WARNING",
            InspectionResult::Fail => "FAIL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InspectionResult::Pass => "Passed",
            InspectionResult::Warning => "Warning",
            InspectionResult::Fail => "Failed",
        }
    }
}

impl FromStr for InspectionResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(InspectionResult::Pass),
            "WARNING" => Ok(InspectionResult::Warning),
            "FAIL" => Ok(InspectionResult::Fail),
            _ => Err(format!(
                "Unknown inspection result '{}'. Valid values: pass, warning, fail",
                s
            )),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Account summary embedded in auth responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// Crop batch as returned by `/crop-batches/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    #[serde(default)]
    pub farmer: Option<i64>,
    #[serde(default)]
    pub current_owner: Option<i64>,
    #[serde(default)]
    pub current_owner_username: Option<String>,
    pub status: BatchStatus,
    #[serde(default)]
    pub farm_location: Option<String>,
    #[serde(default)]
    pub crop_type: String,
    #[serde(deserialize_with = "flex_num::required")]
    pub quantity: f64,
    #[serde(default)]
    pub harvest_date: Option<NaiveDate>,
    #[serde(default)]
    pub product_batch_id: String,
    #[serde(default)]
    pub public_batch_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_child_batch: bool,
    #[serde(default)]
    pub parent_batch: Option<i64>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub farmer_base_price_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub distributor_margin_per_unit: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub total_transport_fees: Option<f64>,
}

impl Batch {
    /// Identifier consumers use on the trace page
    pub fn trace_id(&self) -> &str {
        self.public_batch_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.product_batch_id)
    }
}

/// Stakeholder profile (used for retailer / distributor pickers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeholderProfile {
    pub id: i64,
    #[serde(default)]
    pub user: Option<i64>,
    #[serde(default)]
    pub user_details: Option<User>,
    pub role: Role,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub kyc_status: Option<KycStatus>,
}

impl StakeholderProfile {
    /// Picker label: username, then organization
    pub fn display_name(&self) -> &str {
        if let Some(user) = &self.user_details {
            if !user.username.is_empty() {
                return &user.username;
            }
        }
        if !self.organization.is_empty() {
            return &self.organization;
        }
        "Unknown"
    }
}

/// One leg of physical movement of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRequest {
    pub id: i64,
    pub batch: i64,
    #[serde(default)]
    pub batch_details: Option<Batch>,
    #[serde(default)]
    pub requested_by: Option<i64>,
    #[serde(default)]
    pub from_party: Option<i64>,
    #[serde(default)]
    pub from_party_details: Option<StakeholderProfile>,
    #[serde(default)]
    pub to_party: Option<i64>,
    #[serde(default)]
    pub to_party_details: Option<StakeholderProfile>,
    #[serde(default)]
    pub transporter: Option<i64>,
    #[serde(default)]
    pub transporter_details: Option<StakeholderProfile>,
    pub status: TransportStatus,
    #[serde(default)]
    pub vehicle_details: String,
    #[serde(default)]
    pub driver_details: String,
    #[serde(default)]
    pub pickup_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub transporter_fee_per_unit: Option<f64>,
}

impl TransportRequest {
    pub fn from_role(&self) -> Option<Role> {
        self.from_party_details.as_ref().map(|p| p.role)
    }

    pub fn to_role(&self) -> Option<Role> {
        self.to_party_details.as_ref().map(|p| p.role)
    }
}

/// Inspection report filed by a stakeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: i64,
    pub batch: i64,
    pub stage: InspectionStage,
    #[serde(default)]
    pub result: InspectionResult,
    #[serde(default)]
    pub inspection_notes: String,
    #[serde(default)]
    pub report_file: Option<String>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub inspected_at: Option<DateTime<Utc>>,
}

impl InspectionRecord {
    /// Best timestamp for ordering
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.inspected_at.or(self.created_at)
    }
}

/// Retail listing with its price breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailListing {
    pub id: i64,
    pub batch: i64,
    #[serde(default)]
    pub batch_details: Option<Batch>,
    #[serde(default)]
    pub retailer: Option<i64>,
    #[serde(default, deserialize_with = "flex_num::lenient")]
    pub farmer_base_price: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::lenient")]
    pub transport_fees: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::lenient")]
    pub distributor_margin: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::lenient")]
    pub retailer_margin: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub is_for_sale: bool,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub remaining_quantity: Option<f64>,
    #[serde(default, deserialize_with = "flex_num::optional")]
    pub sold_quantity: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl RetailListing {
    pub fn price_breakdown(&self) -> crate::forms::PriceBreakdown {
        crate::forms::PriceBreakdown {
            farmer_base: self.farmer_base_price,
            transport_fees: self.transport_fees,
            distributor_margin: self.distributor_margin,
            retailer_margin: self.retailer_margin,
        }
    }

    /// Still offered for sale with stock remaining
    pub fn is_active(&self) -> bool {
        self.is_for_sale && self.remaining_quantity.map_or(true, |q| q > 0.0)
    }
}

/// KYC document record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycRecord {
    pub id: i64,
    pub profile: i64,
    #[serde(default)]
    pub profile_details: Option<StakeholderProfile>,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub document_number: String,
    #[serde(default)]
    pub document_file: Option<String>,
    pub status: KycStatus,
    #[serde(default)]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Persisted split of a parent batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSplit {
    pub id: i64,
    pub parent_batch: i64,
    pub split_label: String,
    #[serde(deserialize_with = "flex_num::required")]
    pub quantity: f64,
    #[serde(default)]
    pub destination_retailer: Option<i64>,
    #[serde(default)]
    pub child_batch: Option<i64>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// User row in the admin user list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date_joined: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub stakeholderprofile: Option<StakeholderProfile>,
}

/// Admin dashboard counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub pending_kyc: u64,
    #[serde(default)]
    pub approved_kyc: u64,
    #[serde(default)]
    pub rejected_kyc: u64,
    #[serde(default)]
    pub users_by_role: std::collections::BTreeMap<String, u64>,
}

// ============================================================================
// Public Trace
// ============================================================================

/// Response of the public `/public/trace/{id}/` lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceReport {
    #[serde(default)]
    pub success: bool,
    pub batch: TraceBatch,
    pub farmer: TraceFarmer,
    #[serde(default)]
    pub timeline: Vec<TraceEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceBatch {
    pub id: String,
    #[serde(default)]
    pub crop_type: String,
    #[serde(deserialize_with = "flex_num::required")]
    pub quantity: f64,
    #[serde(default)]
    pub harvest_date: Option<NaiveDate>,
    pub status: BatchStatus,
    #[serde(default)]
    pub current_owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceFarmer {
    pub name: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// One step of a batch's journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub stage: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actor: String,
    #[serde(default)]
    pub actor_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl TraceEvent {
    /// Price breakdown carried by retail events, if present
    pub fn price_breakdown(&self) -> Option<crate::forms::PriceBreakdown> {
        let raw = self.details.get("price_breakdown")?;
        let field = |key: &str| raw.get(key).and_then(flex_num::from_value);
        Some(crate::forms::PriceBreakdown {
            farmer_base: field("farmer_base"),
            transport_fees: field("transport"),
            distributor_margin: field("distributor_margin"),
            retailer_margin: field("retailer_margin"),
        })
    }
}

// ============================================================================
// Decimal Fields
// ============================================================================

/// Django serializes decimals as strings ("500.00") and computed fields as
/// numbers. Both are accepted.
pub(crate) mod flex_num {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    fn parse<E: serde::de::Error>(raw: NumOrString) -> Result<Option<f64>, E> {
        match raw {
            NumOrString::Num(n) => Ok(Some(n)),
            NumOrString::Str(s) if s.trim().is_empty() => Ok(None),
            NumOrString::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid decimal '{}'", s))),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let raw = NumOrString::deserialize(deserializer)?;
        parse(raw)?.ok_or_else(|| serde::de::Error::custom("empty decimal"))
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumOrString>::deserialize(deserializer)? {
            Some(raw) => parse(raw),
            None => Ok(None),
        }
    }

    /// Price components: anything that is not a number reads as missing
    pub fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(from_value))
    }

    /// Lenient read out of an untyped JSON value
    pub fn from_value(value: &serde_json::Value) -> Option<f64> {
        match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("FARMER".parse::<Role>().unwrap(), Role::Farmer);
        assert_eq!("retailer".parse::<Role>().unwrap(), Role::Retailer);
        assert!("grower".parse::<Role>().is_err());

        let role: Role = serde_json::from_value(json!("distributor")).unwrap();
        assert_eq!(role, Role::Distributor);
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("ADMIN"));
    }

    #[test]
    fn test_dashboard_path() {
        assert_eq!(Role::Farmer.dashboard_path(), "/farmer/dashboard");
        assert_eq!(Role::Admin.dashboard_path(), "/admin/dashboard");
    }

    #[test]
    fn test_unknown_batch_status_survives() {
        let status: BatchStatus = serde_json::from_value(json!("QUARANTINED")).unwrap();
        assert_eq!(status, BatchStatus::Unknown("QUARANTINED".into()));
        assert!(!status.is_known());
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("QUARANTINED"));

        let stored: BatchStatus = serde_json::from_value(json!("FULLY_SPLIT")).unwrap();
        assert_eq!(stored, BatchStatus::FullySplit);
        assert_eq!(stored.label(), "FULLY SPLIT");
    }

    #[test]
    fn test_batch_decimal_strings() {
        let batch: Batch = serde_json::from_value(json!({
            "id": 7,
            "status": "STORED",
            "crop_type": "Wheat",
            "quantity": "500.00",
            "harvest_date": "2024-04-20",
            "product_batch_id": "PB-0007",
            "public_batch_id": null,
            "farmer_base_price_per_unit": "12.50",
            "total_transport_fees": 3.0,
            "unexpected_field": true
        }))
        .unwrap();

        assert_eq!(batch.quantity, 500.0);
        assert_eq!(batch.farmer_base_price_per_unit, Some(12.5));
        assert_eq!(batch.distributor_margin_per_unit, None);
        assert_eq!(batch.total_transport_fees, Some(3.0));
        assert_eq!(batch.trace_id(), "PB-0007");
    }

    #[test]
    fn test_profile_display_name_fallbacks() {
        let mut profile: StakeholderProfile = serde_json::from_value(json!({
            "id": 1,
            "role": "retailer",
            "organization": "Shyam Kirana Store",
            "user_details": { "id": 3, "username": "shyam" }
        }))
        .unwrap();
        assert_eq!(profile.display_name(), "shyam");

        profile.user_details = None;
        assert_eq!(profile.display_name(), "Shyam Kirana Store");

        profile.organization.clear();
        assert_eq!(profile.display_name(), "Unknown");
    }

    #[test]
    fn test_listing_tolerates_bad_price_component() {
        let listing: RetailListing = serde_json::from_value(json!({
            "id": 3,
            "batch": 12,
            "farmer_base_price": "18.00",
            "transport_fees": "n/a",
            "distributor_margin": 2,
            "retailer_margin": null,
            "is_for_sale": true,
            "remaining_quantity": "40.5"
        }))
        .unwrap();

        assert_eq!(listing.transport_fees, None);
        assert_eq!(listing.retailer_margin, None);
        assert_eq!(listing.remaining_quantity, Some(40.5));
        assert_eq!(listing.price_breakdown().total(), 20.0);
    }

    #[test]
    fn test_trace_event_price_breakdown() {
        let event: TraceEvent = serde_json::from_value(json!({
            "stage": "Retail Sale",
            "status": "for_sale",
            "actor": "shyam",
            "details": {
                "price": 25.0,
                "price_breakdown": {
                    "farmer_base": 18.0,
                    "transport": "2.5",
                    "distributor_margin": 2.0
                }
            }
        }))
        .unwrap();

        let breakdown = event.price_breakdown().unwrap();
        assert_eq!(breakdown.retailer_margin, None);
        assert_eq!(breakdown.total(), 22.5);
    }
}
