//! ============================================================================
//! Forms Module - Client-side checks that run before any request
//! ============================================================================
//! Each draft holds what the user typed (strings, as entered) and turns it
//! into a typed request body with `validate()`. A `ValidationError` means
//! nothing was sent.
//! ============================================================================

mod batch;
mod inspection;
mod listing;
mod price;
mod quantity;
mod registration;
mod split;

pub use batch::{BatchDraft, BatchRequest};
pub use inspection::InspectionDraft;
pub use listing::{listable_batches, ListingDraft, ListingRequest};
pub use price::{format_rupees, parse_amount, PriceBreakdown};
pub use quantity::{per_unit_amount, sold_quantity};
pub use registration::{RegistrationDraft, RegistrationRequest, MIN_PASSWORD_LEN};
pub use split::{BulkSplitRequest, SplitDraft, SplitItem, SplitPolicy, SplitRow, SPLIT_EPSILON};
