//! United States calendars.

use chrono::Weekday;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::holidays::{HolidaySet, HolidaySetBuilder, Observance};
use super::Calendar;
use crate::types::Date;

/// US market variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UsMarket {
    /// Generic settlement calendar (Federal Reserve holidays).
    #[default]
    Settlement,
    /// New York Stock Exchange.
    Nyse,
    /// US government bond market (SIFMA).
    GovernmentBond,
    /// North American Energy Reliability Council.
    Nerc,
}

fn federal_core(builder: HolidaySetBuilder) -> HolidaySetBuilder {
    builder
        .nth_weekday(2, Weekday::Mon, 3, 1971)
        .last_weekday(5, Weekday::Mon)
        .fixed_from(6, 19, 2022, Observance::NearestWeekday)
        .fixed(7, 4, Observance::NearestWeekday)
        .nth_weekday(9, Weekday::Mon, 1, 1970)
        .nth_weekday(11, Weekday::Thu, 4, 1970)
        .fixed(12, 25, Observance::NearestWeekday)
}

static SETTLEMENT: Lazy<HolidaySet> = Lazy::new(|| {
    federal_core(HolidaySetBuilder::new("US settlement"))
        .fixed(1, 1, Observance::NearestWeekday)
        .nth_weekday(1, Weekday::Mon, 3, 1983)
        .nth_weekday(10, Weekday::Mon, 2, 1971)
        .fixed(11, 11, Observance::NearestWeekday)
        .build()
});

static NYSE: Lazy<HolidaySet> = Lazy::new(|| {
    federal_core(HolidaySetBuilder::new("US NYSE"))
        .fixed(1, 1, Observance::SundayToMonday)
        .nth_weekday(1, Weekday::Mon, 3, 1998)
        .easter(-2, 1970)
        // unscheduled closings
        .date(2001, 9, 11)
        .date(2001, 9, 12)
        .date(2001, 9, 13)
        .date(2001, 9, 14)
        .date(2004, 6, 11)
        .date(2007, 1, 2)
        .date(2012, 10, 29)
        .date(2012, 10, 30)
        .date(2018, 12, 5)
        .date(2025, 1, 9)
        .build()
});

static GOVERNMENT_BOND: Lazy<HolidaySet> = Lazy::new(|| {
    federal_core(HolidaySetBuilder::new("US government bond"))
        .fixed(1, 1, Observance::SundayToMonday)
        .nth_weekday(1, Weekday::Mon, 3, 1983)
        .easter(-2, 1970)
        .nth_weekday(10, Weekday::Mon, 2, 1971)
        .fixed(11, 11, Observance::NearestWeekday)
        .date(2018, 12, 5)
        .date(2025, 1, 9)
        .build()
});

static NERC: Lazy<HolidaySet> = Lazy::new(|| {
    HolidaySetBuilder::new("US NERC")
        .fixed(1, 1, Observance::SundayToMonday)
        .last_weekday(5, Weekday::Mon)
        .fixed(7, 4, Observance::SundayToMonday)
        .nth_weekday(9, Weekday::Mon, 1, 1970)
        .nth_weekday(11, Weekday::Thu, 4, 1970)
        .fixed(12, 25, Observance::SundayToMonday)
        .build()
});

/// United States calendars.
///
/// All variants share Presidents' Day, Memorial Day, Juneteenth (since 2022),
/// Independence Day, Labor Day, Thanksgiving and Christmas except NERC, which
/// only observes New Year, Memorial Day, Independence Day, Labor Day,
/// Thanksgiving and Christmas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitedStates {
    market: UsMarket,
}

impl UnitedStates {
    /// Creates the calendar for a market.
    #[must_use]
    pub fn new(market: UsMarket) -> Self {
        Self { market }
    }

    /// Returns the market variant.
    #[must_use]
    pub fn market(&self) -> UsMarket {
        self.market
    }

    fn holidays(&self) -> &'static HolidaySet {
        match self.market {
            UsMarket::Settlement => &*SETTLEMENT,
            UsMarket::Nyse => &*NYSE,
            UsMarket::GovernmentBond => &*GOVERNMENT_BOND,
            UsMarket::Nerc => &*NERC,
        }
    }
}

impl Calendar for UnitedStates {
    fn name(&self) -> &'static str {
        self.holidays().name()
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !self.holidays().contains(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_settlement_2025() {
        let cal = UnitedStates::new(UsMarket::Settlement);
        for holiday in [
            d(2025, 1, 1),
            d(2025, 1, 20),
            d(2025, 2, 17),
            d(2025, 5, 26),
            d(2025, 6, 19),
            d(2025, 7, 4),
            d(2025, 9, 1),
            d(2025, 10, 13),
            d(2025, 11, 11),
            d(2025, 11, 27),
            d(2025, 12, 25),
        ] {
            assert!(!cal.is_business_day(holiday), "{holiday} should be closed");
        }
        // Good Friday is open for settlement
        assert!(cal.is_business_day(d(2025, 4, 18)));
    }

    #[test]
    fn test_saturday_new_year_moves_to_friday() {
        // 2022-01-01 is a Saturday
        let cal = UnitedStates::new(UsMarket::Settlement);
        assert!(!cal.is_business_day(d(2021, 12, 31)));
        let nyse = UnitedStates::new(UsMarket::Nyse);
        assert!(nyse.is_business_day(d(2021, 12, 31)));
    }

    #[test]
    fn test_nyse_and_government_bond() {
        let nyse = UnitedStates::new(UsMarket::Nyse);
        assert!(!nyse.is_business_day(d(2025, 4, 18)));
        assert!(nyse.is_business_day(d(2025, 10, 13)));
        assert!(!nyse.is_business_day(d(2012, 10, 29)));

        let govt = UnitedStates::new(UsMarket::GovernmentBond);
        assert!(!govt.is_business_day(d(2025, 4, 18)));
        assert!(!govt.is_business_day(d(2025, 10, 13)));
    }

    #[test]
    fn test_nerc() {
        let nerc = UnitedStates::new(UsMarket::Nerc);
        assert!(nerc.is_business_day(d(2025, 1, 20)));
        assert!(!nerc.is_business_day(d(2025, 11, 27)));
        assert_eq!(nerc.name(), "US NERC");
    }
}
