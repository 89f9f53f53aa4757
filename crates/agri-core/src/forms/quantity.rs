// ============================================================================
// Small numeric prompts: sale quantity, per-unit fees and margins
// ============================================================================

use super::price::parse_amount;
use crate::error::ValidationError;

/// Quantity to sell from a listing with `remaining` kg left
pub fn sold_quantity(raw: &str, remaining: f64) -> Result<f64, ValidationError> {
    let quantity = match parse_amount(raw) {
        Some(q) if q > 0.0 => q,
        _ => return Err(ValidationError::InvalidQuantity),
    };
    if quantity > remaining {
        return Err(ValidationError::ExceedsAvailable {
            available: remaining.to_string(),
        });
    }
    Ok(quantity)
}

/// Per-unit amount such as a transport fee or storage margin; blank is 0
pub fn per_unit_amount(raw: &str, field: &'static str) -> Result<f64, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(0.0);
    }
    match parse_amount(raw) {
        Some(value) if value >= 0.0 => Ok(value),
        _ => Err(ValidationError::InvalidAmount { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sold_quantity() {
        assert_eq!(sold_quantity("25", 100.0), Ok(25.0));
        assert_eq!(sold_quantity("0", 100.0), Err(ValidationError::InvalidQuantity));
        assert_eq!(
            sold_quantity("150", 100.0).unwrap_err().to_string(),
            "Cannot sell more than available (100 kg)"
        );
    }

    #[test]
    fn test_per_unit_amount() {
        assert_eq!(per_unit_amount("", "Transport fee"), Ok(0.0));
        assert_eq!(per_unit_amount("1.25", "Transport fee"), Ok(1.25));
        assert_eq!(
            per_unit_amount("-2", "Distributor margin"),
            Err(ValidationError::InvalidAmount { field: "Distributor margin" })
        );
    }
}
