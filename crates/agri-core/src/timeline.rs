//! ============================================================================
//! Inspection Timeline - Per-batch inspection history grouped by stage
//! ============================================================================
//! Groups follow the supply-chain order (farmer, transporter, distributor,
//! retailer); records inside a group run oldest first. At most one record is
//! expanded at a time.
//! ============================================================================

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::{InspectionRecord, InspectionStage, Role};

/// `Jan 5, 2024, 10:30 AM`
const DATE_FORMAT: &str = "%b %-d, %Y, %I:%M %p";

/// Timestamp as shown on timeline cards; `-` when unknown
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|ts| ts.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Clone)]
pub struct StageGroup {
    pub stage: InspectionStage,
    pub records: Vec<InspectionRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct InspectionTimeline {
    groups: Vec<StageGroup>,
    expanded: Option<i64>,
}

impl InspectionTimeline {
    pub fn from_records(records: Vec<InspectionRecord>) -> Self {
        let mut by_stage: BTreeMap<InspectionStage, Vec<InspectionRecord>> = BTreeMap::new();
        for record in records {
            by_stage.entry(record.stage).or_default().push(record);
        }

        let groups = by_stage
            .into_iter()
            .map(|(stage, mut records)| {
                // Undated records go last
                records.sort_by_key(|r| (r.timestamp().is_none(), r.timestamp()));
                StageGroup { stage, records }
            })
            .collect();

        Self { groups, expanded: None }
    }

    /// Non-empty groups in stage order
    pub fn groups(&self) -> &[StageGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// Expand a record, or collapse it if it is already open
    pub fn toggle(&mut self, record_id: i64) {
        self.expanded = match self.expanded {
            Some(open) if open == record_id => None,
            _ => Some(record_id),
        };
    }

    pub fn is_expanded(&self, record_id: i64) -> bool {
        self.expanded == Some(record_id)
    }

    pub fn already_inspected(&self, stage: InspectionStage) -> bool {
        self.groups.iter().any(|g| g.stage == stage && !g.records.is_empty())
    }

    /// Whether `role` may still file its inspection for this batch
    pub fn can_inspect(&self, role: Role) -> bool {
        role.inspection_stage()
            .map_or(false, |stage| !self.already_inspected(stage))
    }
}
