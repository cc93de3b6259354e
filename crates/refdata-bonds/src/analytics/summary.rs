//! Serializable analytics summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cashflows::DatedAmount;

/// Every analytics metric for one bond.
///
/// Metrics that could not be computed are `None`, so the summary always
/// serializes to JSON with `null` in place of NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondSummary {
    /// Clean price in face value units.
    pub clean_price: Option<f64>,
    /// Dirty price in face value units.
    pub dirty_price: Option<f64>,
    /// Accrued interest in face value units.
    pub accrued_interest: Option<f64>,
    /// Price per 100 used for yield solving.
    pub normalized_price: Option<f64>,
    /// Yield to maturity.
    pub yield_to_maturity: Option<f64>,
    /// Yield to worst.
    pub yield_to_worst: Option<f64>,
    /// Modified duration.
    pub modified_duration: Option<f64>,
    /// Macaulay duration.
    pub macaulay_duration: Option<f64>,
    /// Duration under simple compounding.
    pub simple_duration: Option<f64>,
    /// Convexity.
    pub convexity: Option<f64>,
    /// Price change per unit yield change, face value units.
    pub dv01: Option<f64>,
    /// Metrics only some bond types carry (`yield_to_call`, `yield_to_put`,
    /// `option_adjusted_price`).
    #[serde(flatten)]
    pub extras: BTreeMap<String, Option<f64>>,
    /// Flows on or after settlement, aggregated by date.
    pub cashflows: Vec<DatedAmount>,
}

impl BondSummary {
    /// Looks up a type-specific metric.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<f64> {
        self.extras.get(key).copied().flatten()
    }
}

/// `Some` for finite values, `None` otherwise.
/// `None` for NaN and infinities; negative zero becomes zero.
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_serializes_as_null() {
        let mut summary = BondSummary {
            clean_price: finite(99.5),
            yield_to_maturity: finite(f64::NAN),
            ..BondSummary::default()
        };
        summary
            .extras
            .insert("yield_to_call".to_string(), finite(f64::INFINITY));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["clean_price"], serde_json::json!(99.5));
        assert!(json["yield_to_maturity"].is_null());
        assert!(json["yield_to_call"].is_null());
        assert!(json["cashflows"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_negative_zero_serializes_as_zero() {
        let summary = BondSummary {
            clean_price: finite(-0.0),
            ..BondSummary::default()
        };
        assert!(summary.clean_price.unwrap().is_sign_positive());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"clean_price\":0.0"));
    }

    #[test]
    fn test_extra_lookup() {
        let mut summary = BondSummary::default();
        summary.extras.insert("yield_to_put".to_string(), Some(0.04));
        assert_eq!(summary.extra("yield_to_put"), Some(0.04));
        assert_eq!(summary.extra("yield_to_call"), None);
    }
}
