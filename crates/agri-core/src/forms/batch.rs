// ============================================================================
// New crop batch form (farmer)
// ============================================================================

use chrono::NaiveDate;
use serde::Serialize;

use super::price::parse_amount;
use crate::error::ValidationError;

/// Body of `POST /crop-batches/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRequest {
    pub crop_type: String,
    pub quantity: f64,
    pub harvest_date: NaiveDate,
    pub farm_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer_base_price_per_unit: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDraft {
    pub crop_type: String,
    pub quantity: String,
    /// `YYYY-MM-DD`
    pub harvest_date: String,
    pub farm_location: String,
    pub farmer_base_price_per_unit: String,
}

impl BatchDraft {
    pub fn validate(&self) -> Result<BatchRequest, ValidationError> {
        let crop_type = self.crop_type.trim();
        if crop_type.is_empty() {
            return Err(ValidationError::MissingField("Crop type"));
        }

        let quantity = match parse_amount(&self.quantity) {
            Some(q) if q > 0.0 => q,
            _ => return Err(ValidationError::InvalidQuantity),
        };

        let harvest_date = NaiveDate::parse_from_str(self.harvest_date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate { field: "Harvest date" })?;

        let farmer_base_price_per_unit = if self.farmer_base_price_per_unit.trim().is_empty() {
            None
        } else {
            match parse_amount(&self.farmer_base_price_per_unit) {
                Some(price) if price >= 0.0 => Some(price),
                _ => {
                    return Err(ValidationError::InvalidAmount {
                        field: "Base price per unit",
                    })
                }
            }
        };

        Ok(BatchRequest {
            crop_type: crop_type.to_string(),
            quantity,
            harvest_date,
            farm_location: self.farm_location.trim().to_string(),
            farmer_base_price_per_unit,
        })
    }
}
