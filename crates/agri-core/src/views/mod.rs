//! ============================================================================
//! Views Module - What each dashboard lists and which buttons it offers
//! ============================================================================
//! - `actions`: role + status → the actions a row may show
//! - `filters`: which records each page lists, and the search box
//!
//! The backend owns every transition. These tables only decide what to
//! offer; a stale offer fails server-side and surfaces as an alert.
//! ============================================================================

mod actions;
mod filters;

pub use actions::{batch_actions, can_suspend, transport_actions, BatchAction, TransportAction};
pub use filters::{
    active_listings, distributor_incoming, distributor_outgoing, inventory, retailer_received, shipments,
    sold_listings, is_in_transit, IncomingItem, ShipmentLeg,
};
