// ============================================================================
// PriceBreakdown - per-unit retail price components
// ============================================================================

use serde::{Deserialize, Serialize};

/// Four price components of a retail listing. Any may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub farmer_base: Option<f64>,
    pub transport_fees: Option<f64>,
    pub distributor_margin: Option<f64>,
    pub retailer_margin: Option<f64>,
}

impl PriceBreakdown {
    /// Sum of all components; missing or non-finite ones count as 0
    pub fn total(&self) -> f64 {
        self.components()
            .iter()
            .map(|(_, value)| value.filter(|v| v.is_finite()).unwrap_or(0.0))
            .sum()
    }

    /// Labelled components in display order
    pub fn components(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("Farmer Base Price", self.farmer_base),
            ("Transport Fees", self.transport_fees),
            ("Distributor Margin", self.distributor_margin),
            ("Retailer Margin", self.retailer_margin),
        ]
    }
}

/// Lenient numeric read of a form field; blank or garbage is `None`
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rupee amount with Indian digit grouping, e.g. `₹1,23,456.50`
pub fn format_rupees(amount: f64) -> String {
    let rounded = format!("{:.2}", amount.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    // Last three digits, then groups of two
    let mut grouped = String::new();
    let digits: Vec<char> = whole.chars().collect();
    let head_len = digits.len().saturating_sub(3);
    for (i, ch) in digits[..head_len].iter().enumerate() {
        if i > 0 && (head_len - i) % 2 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    if head_len > 0 {
        grouped.push(',');
    }
    grouped.extend(&digits[head_len..]);

    let sign = if amount < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_counts_missing_as_zero() {
        let breakdown = PriceBreakdown {
            farmer_base: Some(20.0),
            transport_fees: None,
            distributor_margin: Some(3.5),
            retailer_margin: Some(1.5),
        };
        assert_eq!(breakdown.total(), 25.0);
        assert_eq!(PriceBreakdown::default().total(), 0.0);
    }

    #[test]
    fn test_total_ignores_non_finite() {
        let breakdown = PriceBreakdown {
            farmer_base: Some(f64::NAN),
            retailer_margin: Some(4.0),
            ..Default::default()
        };
        assert_eq!(breakdown.total(), 4.0);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.50 "), Some(12.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(0.0), "₹0.00");
        assert_eq!(format_rupees(25.0), "₹25.00");
        assert_eq!(format_rupees(1234.5), "₹1,234.50");
        assert_eq!(format_rupees(123456.5), "₹1,23,456.50");
        assert_eq!(format_rupees(12345678.0), "₹1,23,45,678.00");
        assert_eq!(format_rupees(-50.0), "-₹50.00");
    }
}
