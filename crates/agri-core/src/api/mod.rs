//! ============================================================================
//! API Module - REST client for the supply-chain backend
//! ============================================================================
//! - `transport`: the HTTP seam (reqwest in production, a fake in tests)
//! - `client`: bearer auth, error mapping, and session expiry on 401
//! - `endpoints`: one typed method per backend operation
//! ============================================================================

mod client;
mod endpoints;
mod transport;

pub use client::ApiClient;
pub use endpoints::{
    BatchUpdate, ConsumerScan, ConsumerScanRecord, KycDecisionResponse, KycSubmission, ListingUpdate,
    LoginRequest, LoginResponse, MeResponse, MessageResponse, NewBatchSplit, NewTransportRequest,
    ProfileUpdate, RegisterResponse, StakeholderQuery, TransportUpdate, UserUpdate,
};
pub use transport::{
    ApiRequest, ApiResponse, FilePart, HttpTransport, Method, MultipartForm, ReqwestTransport, RequestBody,
};
