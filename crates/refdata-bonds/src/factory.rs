//! Engine construction from bond records.

use crate::analytics::BondAnalytics;
use crate::config::AnalyticsConfig;
use crate::error::{BondError, BondResult};
use crate::models::BondRecord;
use crate::types::BondType;

/// Creates the analytics engine for `record`.
///
/// # Errors
///
/// Returns [`BondError::InvalidBondParameters`] when the declared
/// `bond_type` does not match the record's terms, or when the record fails
/// validation.
pub fn bond_analytics_factory(
    record: BondRecord,
    config: &AnalyticsConfig,
) -> BondResult<BondAnalytics> {
    let expected = record.kind.bond_type();
    if record.bond_type != expected {
        return Err(BondError::invalid_parameters(
            "bond_type",
            format!(
                "declared {} but the record carries {} terms",
                record.bond_type, expected
            ),
        ));
    }
    match record.bond_type {
        BondType::ZeroCoupon
        | BondType::FixedCoupon
        | BondType::Callable
        | BondType::Putable
        | BondType::Floating
        | BondType::SinkingFund => BondAnalytics::new(record, config.clone()),
    }
}

/// Creates an engine with the default configuration.
pub fn bond_analytics(record: BondRecord) -> BondResult<BondAnalytics> {
    bond_analytics_factory(record, &AnalyticsConfig::default())
}

/// Creates an engine from a bond type tag and a record, rejecting tags
/// outside the supported set with [`BondError::UnsupportedBondType`].
pub fn bond_analytics_for_tag(
    tag: &str,
    record: BondRecord,
    config: &AnalyticsConfig,
) -> BondResult<BondAnalytics> {
    let bond_type: BondType = tag.parse()?;
    bond_analytics_factory(record.with_bond_type(bond_type), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BondKind, CouponTerms};
    use crate::types::CouponFrequency;
    use refdata_core::types::Date;
    use rust_decimal_macros::dec;

    fn record(kind: BondKind) -> BondRecord {
        BondRecord::new(
            "BOND",
            Date::from_ymd(2023, 1, 1).unwrap(),
            Date::from_ymd(2028, 1, 1).unwrap(),
            Date::from_ymd(2023, 1, 1).unwrap(),
            dec!(100),
            kind,
        )
    }

    #[test]
    fn test_dispatch_by_declared_type() {
        let engine = bond_analytics(record(BondKind::ZeroCoupon)).unwrap();
        assert_eq!(engine.bond_type(), BondType::ZeroCoupon);
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let mismatched = record(BondKind::ZeroCoupon).with_bond_type(BondType::Callable);
        let err = bond_analytics(mismatched).unwrap_err();
        assert!(matches!(err, BondError::InvalidBondParameters { ref field, .. } if field == "bond_type"));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let fixed = record(BondKind::FixedCoupon {
            coupon: CouponTerms::new(dec!(0.04), CouponFrequency::Annual),
        });
        let err = bond_analytics_for_tag("PERPETUAL", fixed.clone(), &AnalyticsConfig::default())
            .unwrap_err();
        assert!(matches!(err, BondError::UnsupportedBondType { .. }));
        assert!(
            bond_analytics_for_tag("fixed_coupon", fixed, &AnalyticsConfig::default()).is_ok()
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyticsConfig {
            curve_points: 1,
            ..AnalyticsConfig::default()
        };
        let err = bond_analytics_factory(record(BondKind::ZeroCoupon), &config).unwrap_err();
        assert!(matches!(err, BondError::Config(_)));
    }
}
