//! Bond type tags.

use crate::error::BondError;

domain_enum! {
    /// The six bond shapes the analytics layer prices.
    pub enum BondType, unknown = |value: &str| BondError::UnsupportedBondType {
        value: value.to_string(),
    }, {
        /// Single redemption at maturity, no coupons.
        ZeroCoupon => "ZERO_COUPON",
        /// Bullet bond with fixed periodic coupons.
        FixedCoupon => "FIXED_COUPON",
        /// Fixed coupons with an issuer call schedule.
        Callable => "CALLABLE",
        /// Fixed coupons with a holder put schedule.
        Putable => "PUTABLE",
        /// Coupons projected off a reference index.
        Floating => "FLOATING",
        /// Fixed coupons with scheduled partial redemptions.
        SinkingFund => "SINKING_FUND",
    }
}

impl BondType {
    /// Returns true if the bond pays periodic coupons.
    #[must_use]
    pub fn has_coupons(&self) -> bool {
        !matches!(self, BondType::ZeroCoupon)
    }

    /// Returns true if the bond carries an embedded option.
    #[must_use]
    pub fn has_optionality(&self) -> bool {
        matches!(self, BondType::Callable | BondType::Putable)
    }
}

domain_enum! {
    /// How a sinking fund retires principal.
    ///
    /// Informational: the schedule itself always carries absolute notionals.
    pub enum SinkingFundType, unknown = |value: &str| {
        BondError::unsupported_convention("sinking fund type", value)
    }, {
        /// Same amount retired each period.
        FixedAmount => "FIXED_AMOUNT",
        /// Same share of the original face retired each period.
        FixedPercentage => "FIXED_PERCENTAGE",
        /// Varying share per period.
        VariablePercentage => "VARIABLE_PERCENTAGE",
        /// Amortization table agreed at issue.
        ScheduledAmortization => "SCHEDULED_AMORTIZATION",
        /// Issuer may redeem early at its discretion.
        OptionalRedemption => "OPTIONAL_REDEMPTION",
        /// Everything repaid at maturity.
        BulletRedemption => "BULLET_REDEMPTION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bond_type_tags() {
        assert_eq!(BondType::SinkingFund.as_str(), "SINKING_FUND");
        assert_eq!(BondType::from_str("zero_coupon").unwrap(), BondType::ZeroCoupon);
        assert_eq!(BondType::from_str("Fixed Coupon").unwrap(), BondType::FixedCoupon);
        assert_eq!(BondType::all().len(), 6);
    }

    #[test]
    fn test_unknown_bond_type() {
        let err = BondType::from_str("CONVERTIBLE").unwrap_err();
        assert_eq!(
            err,
            BondError::UnsupportedBondType {
                value: "CONVERTIBLE".to_string()
            }
        );
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&BondType::Putable).unwrap();
        assert_eq!(json, "\"PUTABLE\"");
        let parsed: BondType = serde_json::from_str("\"CALLABLE\"").unwrap();
        assert!(parsed.has_optionality());
    }
}
