// ============================================================================
// Batch split form
// ============================================================================
// Two screens split a stored batch and they disagree on the quantity rule,
// so the rule is a named `SplitPolicy` picked by the caller:
//   - AtMost:     sum <= parent; each row needs a label and a destination
//   - ExactMatch: |sum - parent| <= 0.001; each row needs label and quantity
// ============================================================================

use serde::Serialize;

use super::price::parse_amount;
use crate::error::ValidationError;
use crate::types::Batch;

/// Tolerance for `SplitPolicy::ExactMatch`
pub const SPLIT_EPSILON: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Dashboard split: rows go to retailers, remainder stays with the parent
    AtMost,
    /// Inventory split: rows must consume the parent exactly
    ExactMatch,
}

/// One editable split row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitRow {
    pub label: String,
    pub quantity: String,
    pub destination_retailer: Option<i64>,
    pub notes: String,
}

impl SplitRow {
    pub fn new(label: &str, quantity: &str) -> Self {
        Self {
            label: label.to_string(),
            quantity: quantity.to_string(),
            ..Default::default()
        }
    }

    pub fn to_retailer(mut self, retailer_id: i64) -> Self {
        self.destination_retailer = Some(retailer_id);
        self
    }

    fn parsed_quantity(&self) -> f64 {
        parse_amount(&self.quantity).unwrap_or(0.0)
    }
}

/// Wire item of a bulk split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitItem {
    pub label: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_retailer: Option<i64>,
    pub notes: String,
}

/// Body of `POST /crop-batches/{id}/bulk-split/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkSplitRequest {
    pub splits: Vec<SplitItem>,
}

/// Split form state for one parent batch
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDraft {
    pub parent_id: i64,
    pub parent_batch_id: String,
    pub parent_quantity: f64,
    pub policy: SplitPolicy,
    pub rows: Vec<SplitRow>,
}

impl SplitDraft {
    /// Fresh form with one empty row
    pub fn new(parent: &Batch, policy: SplitPolicy) -> Self {
        Self {
            parent_id: parent.id,
            parent_batch_id: parent.product_batch_id.clone(),
            parent_quantity: parent.quantity,
            policy,
            rows: vec![SplitRow::default()],
        }
    }

    pub fn with_rows(mut self, rows: Vec<SplitRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn add_row(&mut self) {
        self.rows.push(SplitRow::default());
    }

    /// Remove a row; the last remaining row is kept
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows.len() > 1 && index < self.rows.len() {
            self.rows.remove(index);
            true
        } else {
            false
        }
    }

    /// Running total, unparseable quantities counted as 0
    pub fn total(&self) -> f64 {
        self.rows.iter().map(SplitRow::parsed_quantity).sum()
    }

    pub fn remaining(&self) -> f64 {
        self.parent_quantity - self.total()
    }

    /// Check the form and build the request body. Nothing is sent on error.
    pub fn validate(&self) -> Result<BulkSplitRequest, ValidationError> {
        if self.rows.is_empty() {
            return Err(ValidationError::NoSplits);
        }

        match self.policy {
            SplitPolicy::ExactMatch => {
                self.check_total()?;
                self.check_rows()?;
            }
            SplitPolicy::AtMost => {
                self.check_rows()?;
                self.check_total()?;
            }
        }

        let default_notes = format!("Split from {}", self.parent_batch_id);
        let splits = self
            .rows
            .iter()
            .map(|row| SplitItem {
                label: row.label.trim().to_string(),
                quantity: row.parsed_quantity(),
                destination_retailer: row.destination_retailer,
                notes: if row.notes.trim().is_empty() {
                    default_notes.clone()
                } else {
                    row.notes.trim().to_string()
                },
            })
            .collect();

        Ok(BulkSplitRequest { splits })
    }

    fn check_rows(&self) -> Result<(), ValidationError> {
        for (i, row) in self.rows.iter().enumerate() {
            let index = i + 1;
            let missing_label = row.label.trim().is_empty();
            let incomplete = match self.policy {
                SplitPolicy::AtMost => missing_label || row.destination_retailer.is_none(),
                SplitPolicy::ExactMatch => missing_label || row.quantity.trim().is_empty(),
            };
            if incomplete {
                return Err(ValidationError::IncompleteSplit { index });
            }
            if !matches!(parse_amount(&row.quantity), Some(q) if q > 0.0) {
                return Err(ValidationError::InvalidSplitQuantity { index });
            }
        }
        Ok(())
    }

    fn check_total(&self) -> Result<(), ValidationError> {
        let total = self.total();
        let parent = self.parent_quantity;
        match self.policy {
            SplitPolicy::AtMost if total > parent => Err(ValidationError::SplitExceedsParent {
                total: total.to_string(),
                parent: parent.to_string(),
            }),
            SplitPolicy::ExactMatch if (total - parent).abs() > SPLIT_EPSILON => {
                Err(ValidationError::SplitMismatch {
                    total: total.to_string(),
                    parent: parent.to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_batch;
    use crate::types::BatchStatus;

    fn parent(quantity: f64) -> Batch {
        Batch {
            quantity,
            ..sample_batch(9, BatchStatus::Stored)
        }
    }

    #[test]
    fn test_at_most_blocks_oversplit() {
        let draft = SplitDraft::new(&parent(500.0), SplitPolicy::AtMost).with_rows(vec![
            SplitRow::new("A", "300").to_retailer(4),
            SplitRow::new("B", "250").to_retailer(5),
        ]);
        let err = draft.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Total split quantity (550 kg) cannot exceed parent batch quantity (500 kg)"
        );
    }

    #[test]
    fn test_at_most_allows_partial_split() {
        let draft = SplitDraft::new(&parent(500.0), SplitPolicy::AtMost)
            .with_rows(vec![SplitRow::new("A", "200").to_retailer(4)]);
        let request = draft.validate().unwrap();
        assert_eq!(request.splits.len(), 1);
        assert_eq!(request.splits[0].destination_retailer, Some(4));
        assert_eq!(request.splits[0].notes, "Split from PB-0009");
        assert_eq!(draft.remaining(), 300.0);
    }

    #[test]
    fn test_at_most_requires_destination() {
        let draft = SplitDraft::new(&parent(500.0), SplitPolicy::AtMost).with_rows(vec![
            SplitRow::new("A", "100").to_retailer(4),
            SplitRow::new("B", "100"),
        ]);
        assert_eq!(draft.validate(), Err(ValidationError::IncompleteSplit { index: 2 }));
    }

    #[test]
    fn test_exact_match_tolerance() {
        let ok = SplitDraft::new(&parent(500.0), SplitPolicy::ExactMatch).with_rows(vec![
            SplitRow::new("A", "250.0005"),
            SplitRow::new("B", "250"),
        ]);
        assert!(ok.validate().is_ok());

        let short = SplitDraft::new(&parent(500.0), SplitPolicy::ExactMatch).with_rows(vec![
            SplitRow::new("A", "250"),
            SplitRow::new("B", "240"),
        ]);
        assert_eq!(
            short.validate().unwrap_err().to_string(),
            "Total split quantity (490 kg) must exactly match parent batch quantity (500 kg)"
        );
    }

    #[test]
    fn test_exact_match_checks_total_before_fields() {
        let short = SplitDraft::new(&parent(100.0), SplitPolicy::ExactMatch)
            .with_rows(vec![SplitRow::new("A", "50"), SplitRow::new("", "")]);
        assert!(matches!(short.validate(), Err(ValidationError::SplitMismatch { .. })));

        let blank_label = SplitDraft::new(&parent(100.0), SplitPolicy::ExactMatch)
            .with_rows(vec![SplitRow::new("A", "60"), SplitRow::new(" ", "40")]);
        assert_eq!(blank_label.validate(), Err(ValidationError::IncompleteSplit { index: 2 }));
    }

    #[test]
    fn test_row_editing() {
        let mut draft = SplitDraft::new(&parent(10.0), SplitPolicy::ExactMatch);
        assert!(!draft.remove_row(0));
        draft.add_row();
        assert_eq!(draft.rows.len(), 2);
        assert!(draft.remove_row(1));
        assert_eq!(draft.rows.len(), 1);
    }
}
