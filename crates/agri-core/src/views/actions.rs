// ============================================================================
// Row actions per role and status
// ============================================================================

use std::fmt;

use crate::timeline::InspectionTimeline;
use crate::types::{BatchStatus, Role, TransportRequest, TransportStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchAction {
    RequestTransport,
    Store,
    RequestTransportToRetailer,
    Split,
    Inspect,
    CreateListing,
    MarkSold,
    Suspend,
}

impl BatchAction {
    pub fn label(&self) -> &'static str {
        match self {
            BatchAction::RequestTransport => "Request Transport",
            BatchAction::Store => "Store",
            BatchAction::RequestTransportToRetailer => "Send to Retailer",
            BatchAction::Split => "Split Batch",
            BatchAction::Inspect => "Inspect",
            BatchAction::CreateListing => "Create Listing",
            BatchAction::MarkSold => "Mark Sold",
            BatchAction::Suspend => "Suspend",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statuses from which `role` may suspend a batch it holds
pub fn can_suspend(role: Role, status: &BatchStatus) -> bool {
    match role {
        Role::Farmer => matches!(
            status,
            BatchStatus::Created | BatchStatus::TransportRequested | BatchStatus::TransportRejected
        ),
        Role::Distributor => matches!(status, BatchStatus::DeliveredToDistributor | BatchStatus::Stored),
        Role::Retailer => matches!(status, BatchStatus::Listed),
        _ => false,
    }
}

/// Actions offered on a batch row. Pass the batch's inspection timeline when
/// it is loaded so Inspect disappears once this role's stage is filed.
pub fn batch_actions(role: Role, status: &BatchStatus, timeline: Option<&InspectionTimeline>) -> Vec<BatchAction> {
    let mut actions = match (role, status) {
        (Role::Farmer, BatchStatus::Created) => vec![BatchAction::RequestTransport],
        (Role::Distributor, BatchStatus::DeliveredToDistributor)
        | (Role::Distributor, BatchStatus::ArrivalConfirmedByDistributor) => vec![BatchAction::Store],
        (Role::Distributor, BatchStatus::Stored) => vec![
            BatchAction::RequestTransportToRetailer,
            BatchAction::Split,
            BatchAction::Inspect,
        ],
        (Role::Retailer, BatchStatus::DeliveredToRetailer) => vec![BatchAction::CreateListing],
        (Role::Retailer, BatchStatus::Listed) => vec![BatchAction::MarkSold],
        _ => Vec::new(),
    };

    if timeline.map_or(false, |t| !t.can_inspect(role)) {
        actions.retain(|a| *a != BatchAction::Inspect);
    }
    if can_suspend(role, status) {
        actions.push(BatchAction::Suspend);
    }
    actions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportAction {
    Accept,
    Reject,
    MarkArrived,
    ConfirmArrival,
    MarkDelivered,
}

impl TransportAction {
    pub fn label(&self) -> &'static str {
        match self {
            TransportAction::Accept => "Accept",
            TransportAction::Reject => "Reject",
            TransportAction::MarkArrived => "Mark Arrived",
            TransportAction::ConfirmArrival => "Confirm Arrival",
            TransportAction::MarkDelivered => "Mark Delivered",
        }
    }
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions offered on a transport request. The transporter drives the leg;
/// the receiving party only confirms arrival.
pub fn transport_actions(role: Role, request: &TransportRequest) -> Vec<TransportAction> {
    match role {
        Role::Transporter => match request.status {
            TransportStatus::Pending => vec![TransportAction::Accept, TransportAction::Reject],
            TransportStatus::Accepted | TransportStatus::InTransit | TransportStatus::InTransitToRetailer => {
                vec![TransportAction::MarkArrived]
            }
            TransportStatus::ArrivalConfirmed => vec![TransportAction::MarkDelivered],
            _ => Vec::new(),
        },
        Role::Distributor | Role::Retailer => {
            let is_receiver = request.to_role().map_or(true, |to| to == role);
            if is_receiver && request.status == TransportStatus::Arrived {
                vec![TransportAction::ConfirmArrival]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}
