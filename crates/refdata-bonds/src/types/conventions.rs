//! Convention tags carried on bond records.
//!
//! These are the record-side spellings. The mappers in
//! [`crate::conventions`] turn them into market primitives.

use refdata_core::types::Frequency;

use crate::error::BondError;

domain_enum! {
    /// Day count convention tag.
    pub enum DayCountConventionKind, unknown = |value: &str| {
        BondError::unsupported_convention("day count convention", value)
    }, {
        /// Actual/Actual (ISDA).
        ActualActual => "ACTUAL_ACTUAL",
        /// Actual/360.
        Actual360 => "ACTUAL_360",
        /// Actual/360, short spelling.
        Act360 => "ACT360",
        /// Actual/365 Fixed.
        Actual365Fixed => "ACTUAL_365_FIXED",
        /// Actual/365 Fixed, short spelling.
        Act365 => "ACT365",
        /// 30/360, US rules.
        Thirty360 => "THIRTY_360",
        /// 30/360 US.
        Thirty360Us => "THIRTY_360_US",
        /// 30E/360 (Eurobond basis).
        ThirtyE360 => "THIRTY_E_360",
        /// 30E/360 ISDA.
        ThirtyE360Isda => "THIRTY_E_360_ISDA",
        /// Business/252.
        Business252 => "BUSINESS_252",
    }
}

impl Default for DayCountConventionKind {
    fn default() -> Self {
        DayCountConventionKind::Actual365Fixed
    }
}

domain_enum! {
    /// Compounding rule tag.
    pub enum CompoundingKind, unknown = |value: &str| {
        BondError::unsupported_convention("compounding", value)
    }, {
        /// Simple interest.
        Simple => "SIMPLE",
        /// Periodic compounding.
        Compounded => "COMPOUNDED",
        /// Continuous compounding.
        Continuous => "CONTINUOUS",
        /// Simple up to one period, compounded after.
        SimpleThenCompounded => "SIMPLE_THEN_COMPOUNDED",
        /// Compounded up to one period, simple after.
        CompoundedThenSimple => "COMPOUNDED_THEN_SIMPLE",
    }
}

impl Default for CompoundingKind {
    fn default() -> Self {
        CompoundingKind::Compounded
    }
}

domain_enum! {
    /// Rate compounding frequency tag.
    pub enum FrequencyKind, unknown = |value: &str| {
        BondError::unsupported_convention("frequency", value)
    }, {
        /// Lump sum.
        NoFrequency => "NO_FREQUENCY",
        /// Single payment.
        Once => "ONCE",
        /// Yearly.
        Annual => "ANNUAL",
        /// Every 6 months.
        Semiannual => "SEMIANNUAL",
        /// Every 3 months.
        Quarterly => "QUARTERLY",
        /// Every month.
        Monthly => "MONTHLY",
        /// Every week.
        Weekly => "WEEKLY",
        /// Every day.
        Daily => "DAILY",
        /// Custom.
        OtherFrequency => "OTHER_FREQUENCY",
    }
}

impl Default for FrequencyKind {
    fn default() -> Self {
        FrequencyKind::Annual
    }
}

domain_enum! {
    /// Coupon payment frequency tag.
    pub enum CouponFrequency, unknown = |value: &str| {
        BondError::unsupported_convention("coupon frequency", value)
    }, {
        /// One coupon a year.
        Annual => "ANNUAL",
        /// Two coupons a year.
        SemiAnnual => "SEMI_ANNUAL",
        /// Four coupons a year.
        Quarterly => "QUARTERLY",
        /// Twelve coupons a year.
        Monthly => "MONTHLY",
    }
}

impl CouponFrequency {
    /// Returns the number of coupons per year.
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            CouponFrequency::Annual => 1,
            CouponFrequency::SemiAnnual => 2,
            CouponFrequency::Quarterly => 4,
            CouponFrequency::Monthly => 12,
        }
    }

    /// Returns the length of a coupon period in months.
    #[must_use]
    pub fn months_per_period(&self) -> i32 {
        12 / self.periods_per_year() as i32
    }

    /// Returns the matching core frequency.
    #[must_use]
    pub fn to_frequency(&self) -> Frequency {
        match self {
            CouponFrequency::Annual => Frequency::Annual,
            CouponFrequency::SemiAnnual => Frequency::Semiannual,
            CouponFrequency::Quarterly => Frequency::Quarterly,
            CouponFrequency::Monthly => Frequency::Monthly,
        }
    }
}

impl Default for CouponFrequency {
    fn default() -> Self {
        CouponFrequency::SemiAnnual
    }
}

domain_enum! {
    /// Business day convention tag.
    pub enum BusinessDayConventionKind, unknown = |value: &str| {
        BondError::unsupported_convention("business day convention", value)
    }, {
        /// Next business day.
        Following => "FOLLOWING",
        /// Next business day unless it crosses month-end.
        ModifiedFollowing => "MODIFIED_FOLLOWING",
        /// Previous business day.
        Preceding => "PRECEDING",
        /// Previous business day unless it crosses month-start.
        ModifiedPreceding => "MODIFIED_PRECEDING",
        /// No adjustment.
        Unadjusted => "UNADJUSTED",
        /// Modified following that also stays within the half month.
        HalfMonthModifiedFollowing => "HALF_MONTH_MODIFIED_FOLLOWING",
        /// Closest business day, following on ties.
        Nearest => "NEAREST",
    }
}

impl Default for BusinessDayConventionKind {
    fn default() -> Self {
        BusinessDayConventionKind::Following
    }
}

domain_enum! {
    /// Holiday calendar tag.
    pub enum CalendarKind, unknown = |value: &str| {
        BondError::unsupported_convention("calendar", value)
    }, {
        /// Euro interbank calendar.
        Target => "TARGET",
        /// US settlement.
        UsSettlement => "US_SETTLEMENT",
        /// US Treasury market.
        UsGovernmentBond => "US_GOVERNMENT_BOND",
        /// New York stock exchange.
        UsNyse => "US_NYSE",
        /// Federal Reserve banking holidays.
        UsFederalReserve => "US_FEDERAL_RESERVE",
        /// London stock exchange.
        UkExchange => "UK_EXCHANGE",
        /// UK settlement.
        UkSettlement => "UK_SETTLEMENT",
        /// London metals exchange.
        UkMetals => "UK_METALS",
        /// Frankfurt stock exchange.
        GermanyFrankfurtStockExchange => "GERMANY_FRANKFURT_STOCK_EXCHANGE",
        /// Eurex derivatives exchange.
        GermanyEurex => "GERMANY_EUREX",
        /// German settlement.
        GermanySettlement => "GERMANY_SETTLEMENT",
        /// Japan.
        Japan => "JAPAN",
        /// France.
        France => "FRANCE",
        /// Switzerland.
        Switzerland => "SWITZERLAND",
        /// Canada.
        Canada => "CANADA",
        /// Mexico.
        Mexico => "MEXICO",
        /// China.
        China => "CHINA",
        /// Hong Kong.
        HongKong => "HONG_KONG",
        /// Singapore.
        Singapore => "SINGAPORE",
        /// South Korea.
        SouthKorea => "SOUTH_KOREA",
        /// India.
        India => "INDIA",
        /// Indonesia.
        Indonesia => "INDONESIA",
        /// Thailand.
        Thailand => "THAILAND",
        /// Australia.
        Australia => "AUSTRALIA",
        /// New Zealand.
        NewZealand => "NEW_ZEALAND",
        /// Saudi Arabia.
        SaudiArabia => "SAUDI_ARABIA",
        /// Israel.
        Israel => "ISRAEL",
        /// Brazil.
        Brazil => "BRAZIL",
        /// Argentina.
        Argentina => "ARGENTINA",
        /// South Africa.
        SouthAfrica => "SOUTH_AFRICA",
        /// Every day is a business day.
        NullCalendar => "NULL_CALENDAR",
    }
}

impl Default for CalendarKind {
    fn default() -> Self {
        CalendarKind::Target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_day_count_tags() {
        assert_eq!(
            DayCountConventionKind::from_str("THIRTY_E_360_ISDA").unwrap(),
            DayCountConventionKind::ThirtyE360Isda
        );
        assert_eq!(DayCountConventionKind::Act365.to_string(), "ACT365");
        assert!(DayCountConventionKind::from_str("ACT/ACT").is_err());
    }

    #[test]
    fn test_coupon_frequency() {
        assert_eq!(CouponFrequency::SemiAnnual.months_per_period(), 6);
        assert_eq!(CouponFrequency::Monthly.months_per_period(), 1);
        assert_eq!(CouponFrequency::Quarterly.to_frequency(), Frequency::Quarterly);
        assert_eq!(
            CouponFrequency::from_str("semi-annual").unwrap(),
            CouponFrequency::SemiAnnual
        );
    }

    #[test]
    fn test_unknown_calendar_names_value() {
        let err = CalendarKind::from_str("ATLANTIS").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported calendar: ATLANTIS");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(CalendarKind::default(), CalendarKind::Target);
        assert_eq!(
            BusinessDayConventionKind::default(),
            BusinessDayConventionKind::Following
        );
        assert_eq!(CompoundingKind::default(), CompoundingKind::Compounded);
        assert_eq!(FrequencyKind::default(), FrequencyKind::Annual);
    }

    #[test]
    fn test_serde_round_trip_through_tag() {
        let json = serde_json::to_string(&BusinessDayConventionKind::HalfMonthModifiedFollowing)
            .unwrap();
        assert_eq!(json, "\"HALF_MONTH_MODIFIED_FOLLOWING\"");
        let kind: CalendarKind = serde_json::from_str("\"UK_METALS\"").unwrap();
        assert_eq!(kind, CalendarKind::UkMetals);
    }
}
