// ============================================================================
// Page filters and search
// ============================================================================
// Every list page narrows the backend's list client-side, then applies a
// case-insensitive substring search over a few display fields.
// ============================================================================

use std::cmp::Reverse;

use crate::types::{Batch, BatchStatus, RetailListing, Role, TransportRequest, TransportStatus};

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Lowercased search term; `None` when blank
fn normalize_search(search: &str) -> Option<String> {
    let term = search.trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

fn batch_matches(batch: &Batch, term: Option<&str>) -> bool {
    match term {
        None => true,
        Some(term) => contains(&batch.product_batch_id, term) || contains(&batch.crop_type, term),
    }
}

fn newest_first(batch: &Batch) -> Reverse<(Option<chrono::DateTime<chrono::Utc>>, i64)> {
    Reverse((batch.created_at, batch.id))
}

// ============================================================================
// Distributor
// ============================================================================

/// Stored and fully split batches. Each batch is followed by its split
/// lineage, depth first; roots and siblings are newest first. A child whose
/// parent is not listed counts as a root.
pub fn inventory<'a>(batches: &'a [Batch], search: &str) -> Vec<&'a Batch> {
    let term = normalize_search(search);
    let mut selected: Vec<&Batch> = batches
        .iter()
        .filter(|b| matches!(b.status, BatchStatus::Stored | BatchStatus::FullySplit))
        .filter(|b| batch_matches(b, term.as_deref()))
        .collect();
    selected.sort_by_key(|b| newest_first(b));

    let has_parent_listed =
        |b: &Batch| b.parent_batch.map_or(false, |parent| selected.iter().any(|p| p.id == parent));

    let mut ordered = Vec::with_capacity(selected.len());
    for root in selected.iter().filter(|b| !has_parent_listed(b)) {
        push_lineage(*root, &selected, &mut ordered);
    }
    // Parent links that loop back never reach a root
    for batch in &selected {
        push_lineage(*batch, &selected, &mut ordered);
    }
    ordered
}

fn push_lineage<'a>(batch: &'a Batch, selected: &[&'a Batch], ordered: &mut Vec<&'a Batch>) {
    if ordered.iter().any(|b| b.id == batch.id) {
        return;
    }
    ordered.push(batch);
    for child in selected.iter().filter(|c| c.parent_batch == Some(batch.id)) {
        push_lineage(*child, selected, ordered);
    }
}

/// Row on the distributor's incoming page
#[derive(Debug, Clone, Copy)]
pub enum IncomingItem<'a> {
    /// Shipment still on its way (or awaiting confirmation)
    Transport(&'a TransportRequest),
    /// Delivered batch not yet stored
    Batch(&'a Batch),
}

impl<'a> IncomingItem<'a> {
    pub fn id(&self) -> i64 {
        match self {
            IncomingItem::Transport(request) => request.id,
            IncomingItem::Batch(batch) => batch.id,
        }
    }

    pub fn product_batch_id(&self) -> &'a str {
        match self {
            IncomingItem::Transport(request) => request
                .batch_details
                .as_ref()
                .map_or("", |b| b.product_batch_id.as_str()),
            IncomingItem::Batch(batch) => &batch.product_batch_id,
        }
    }

    pub fn crop_type(&self) -> &'a str {
        match self {
            IncomingItem::Transport(request) => request.batch_details.as_ref().map_or("", |b| b.crop_type.as_str()),
            IncomingItem::Batch(batch) => &batch.crop_type,
        }
    }

    pub fn status_label(&self) -> String {
        match self {
            IncomingItem::Transport(request) => request.status.label(),
            IncomingItem::Batch(batch) => batch.status.label(),
        }
    }
}

/// Open shipments addressed to a distributor, then delivered batches
/// awaiting storage
pub fn distributor_incoming<'a>(
    requests: &'a [TransportRequest],
    batches: &'a [Batch],
    search: &str,
) -> Vec<IncomingItem<'a>> {
    let term = normalize_search(search);

    let shipments = requests
        .iter()
        .filter(|r| r.to_role() == Some(Role::Distributor))
        .filter(|r| {
            !matches!(
                r.status,
                TransportStatus::Delivered | TransportStatus::Rejected | TransportStatus::Pending
            )
        })
        .map(IncomingItem::Transport);
    let delivered = batches
        .iter()
        .filter(|b| b.status == BatchStatus::DeliveredToDistributor)
        .map(IncomingItem::Batch);

    shipments
        .chain(delivered)
        .filter(|item| match &term {
            None => true,
            Some(term) => contains(item.product_batch_id(), term) || contains(item.crop_type(), term),
        })
        .collect()
}

/// Shipments the distributor sent onward that are still open
pub fn distributor_outgoing<'a>(requests: &'a [TransportRequest], search: &str) -> Vec<&'a TransportRequest> {
    let term = normalize_search(search);
    requests
        .iter()
        .filter(|r| r.from_role() == Some(Role::Distributor))
        .filter(|r| !matches!(r.status, TransportStatus::Delivered | TransportStatus::Rejected))
        .filter(|r| match &term {
            None => true,
            Some(term) => {
                let batch = r.batch_details.as_ref();
                contains(batch.map_or("", |b| b.product_batch_id.as_str()), term)
                    || contains(batch.map_or("", |b| b.crop_type.as_str()), term)
                    || contains(r.to_party_details.as_ref().map_or("", |p| p.organization.as_str()), term)
            }
        })
        .collect()
}

// ============================================================================
// Retailer
// ============================================================================

/// Delivered to the retailer, not yet listed
pub fn retailer_received<'a>(batches: &'a [Batch], search: &str) -> Vec<&'a Batch> {
    let term = normalize_search(search);
    batches
        .iter()
        .filter(|b| b.status == BatchStatus::DeliveredToRetailer)
        .filter(|b| batch_matches(b, term.as_deref()))
        .collect()
}

fn listing_matches(listing: &RetailListing, term: Option<&str>) -> bool {
    match (term, &listing.batch_details) {
        (None, _) => true,
        (Some(_), Some(batch)) => batch_matches(batch, term),
        (Some(_), None) => false,
    }
}

/// Listings still for sale with stock left
pub fn active_listings<'a>(listings: &'a [RetailListing], search: &str) -> Vec<&'a RetailListing> {
    let term = normalize_search(search);
    listings
        .iter()
        .filter(|l| l.is_active())
        .filter(|l| l.batch_details.as_ref().map_or(true, |b| b.status != BatchStatus::Sold))
        .filter(|l| listing_matches(l, term.as_deref()))
        .collect()
}

/// Listings taken off sale
pub fn sold_listings<'a>(listings: &'a [RetailListing], search: &str) -> Vec<&'a RetailListing> {
    let term = normalize_search(search);
    listings
        .iter()
        .filter(|l| !l.is_for_sale)
        .filter(|l| listing_matches(l, term.as_deref()))
        .collect()
}

// ============================================================================
// Transporter
// ============================================================================

/// Accepted, moving, or waiting at the destination
pub fn is_in_transit(status: &TransportStatus) -> bool {
    matches!(
        status,
        TransportStatus::Accepted
            | TransportStatus::InTransit
            | TransportStatus::InTransitToRetailer
            | TransportStatus::Arrived
            | TransportStatus::ArrivalConfirmed
    )
}

/// Transporter shipment pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipmentLeg {
    All,
    /// Farmer → distributor pickups
    FromFarmers,
    /// Distributor → retailer pickups
    FromDistributors,
    InTransit,
    Completed,
}

impl ShipmentLeg {
    pub fn matches(&self, request: &TransportRequest) -> bool {
        match self {
            ShipmentLeg::All => true,
            ShipmentLeg::FromFarmers => request.from_role() == Some(Role::Farmer),
            ShipmentLeg::FromDistributors => request.from_role() == Some(Role::Distributor),
            ShipmentLeg::InTransit => is_in_transit(&request.status),
            ShipmentLeg::Completed => request.status == TransportStatus::Delivered,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ShipmentLeg::All => "All Shipments",
            ShipmentLeg::FromFarmers => "Farmer Shipments",
            ShipmentLeg::FromDistributors => "Distributor Shipments",
            ShipmentLeg::InTransit => "In Transit",
            ShipmentLeg::Completed => "Completed",
        }
    }
}

/// Requests on one leg, optionally narrowed to a single status, matching
/// the search over batch id, both organizations, and crop type
pub fn shipments<'a>(
    requests: &'a [TransportRequest],
    leg: ShipmentLeg,
    status: Option<&TransportStatus>,
    search: &str,
) -> Vec<&'a TransportRequest> {
    let term = normalize_search(search);
    requests
        .iter()
        .filter(|r| leg.matches(r))
        .filter(|r| status.map_or(true, |s| &r.status == s))
        .filter(|r| match &term {
            None => true,
            Some(term) => {
                let batch = r.batch_details.as_ref();
                let org = |p: Option<&crate::types::StakeholderProfile>| {
                    p.map_or(String::new(), |p| p.organization.clone())
                };
                contains(batch.map_or("", |b| b.product_batch_id.as_str()), term)
                    || contains(&org(r.from_party_details.as_ref()), term)
                    || contains(&org(r.to_party_details.as_ref()), term)
                    || contains(batch.map_or("", |b| b.crop_type.as_str()), term)
            }
        })
        .collect()
}
