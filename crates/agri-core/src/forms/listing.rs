// ============================================================================
// Retail listing form
// ============================================================================

use serde::Serialize;

use super::price::{parse_amount, PriceBreakdown};
use super::quantity::per_unit_amount;
use crate::error::ValidationError;
use crate::types::{Batch, BatchStatus};

/// Body of `POST /retail-listings/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRequest {
    pub batch: i64,
    pub farmer_base_price: f64,
    pub transport_fees: f64,
    pub distributor_margin: f64,
    pub retailer_margin: f64,
    pub is_for_sale: bool,
}

/// New-listing form as typed by the retailer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub batch: Option<i64>,
    pub farmer_base_price: String,
    pub transport_fees: String,
    pub distributor_margin: String,
    pub retailer_margin: String,
}

impl ListingDraft {
    /// Live preview of the total as the form is filled
    pub fn breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            farmer_base: parse_amount(&self.farmer_base_price),
            transport_fees: parse_amount(&self.transport_fees),
            distributor_margin: parse_amount(&self.distributor_margin),
            retailer_margin: parse_amount(&self.retailer_margin),
        }
    }

    pub fn validate(&self) -> Result<ListingRequest, ValidationError> {
        let batch = self.batch.ok_or(ValidationError::MissingSelection("batch"))?;

        Ok(ListingRequest {
            batch,
            farmer_base_price: per_unit_amount(&self.farmer_base_price, "Farmer base price")?,
            transport_fees: per_unit_amount(&self.transport_fees, "Transport fees")?,
            distributor_margin: per_unit_amount(&self.distributor_margin, "Distributor margin")?,
            retailer_margin: per_unit_amount(&self.retailer_margin, "Retailer margin")?,
            is_for_sale: true,
        })
    }
}

/// Batches the current retailer may list: delivered to them and owned by them
pub fn listable_batches(batches: &[Batch], user_id: i64) -> Vec<&Batch> {
    batches
        .iter()
        .filter(|b| b.status == BatchStatus::DeliveredToRetailer && b.current_owner == Some(user_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_batch;

    fn draft(batch: Option<i64>, prices: [&str; 4]) -> ListingDraft {
        ListingDraft {
            batch,
            farmer_base_price: prices[0].into(),
            transport_fees: prices[1].into(),
            distributor_margin: prices[2].into(),
            retailer_margin: prices[3].into(),
        }
    }

    #[test]
    fn test_requires_batch() {
        let err = draft(None, ["20", "2", "1", "2"]).validate().unwrap_err();
        assert_eq!(err.to_string(), "Please select a batch");
    }

    #[test]
    fn test_blank_fields_are_zero() {
        let request = draft(Some(3), ["20", "", "1.5", " "]).validate().unwrap();
        assert_eq!(request.transport_fees, 0.0);
        assert_eq!(request.retailer_margin, 0.0);
        assert!(request.is_for_sale);
        assert_eq!(draft(Some(3), ["20", "", "1.5", ""]).breakdown().total(), 21.5);
    }

    #[test]
    fn test_rejects_negative_and_garbage() {
        assert_eq!(
            draft(Some(3), ["-1", "", "", ""]).validate(),
            Err(ValidationError::InvalidAmount { field: "Farmer base price" })
        );
        assert_eq!(
            draft(Some(3), ["1", "", "", "lots"]).validate(),
            Err(ValidationError::InvalidAmount { field: "Retailer margin" })
        );
    }

    #[test]
    fn test_listable_batches() {
        let mut mine = sample_batch(1, BatchStatus::DeliveredToRetailer);
        mine.current_owner = Some(7);
        let mut theirs = sample_batch(2, BatchStatus::DeliveredToRetailer);
        theirs.current_owner = Some(8);
        let mut listed = sample_batch(3, BatchStatus::Listed);
        listed.current_owner = Some(7);

        let batches = vec![mine, theirs, listed];
        let eligible = listable_batches(&batches, 7);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, 1);
    }
}
