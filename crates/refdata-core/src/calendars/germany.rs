//! German calendars.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::holidays::{HolidaySet, HolidaySetBuilder, Observance};
use super::Calendar;
use crate::types::Date;

/// German market variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GermanyMarket {
    /// Generic settlement calendar.
    #[default]
    Settlement,
    /// Frankfurt stock exchange.
    FrankfurtStockExchange,
    /// Xetra.
    Xetra,
}

static SETTLEMENT: Lazy<HolidaySet> = Lazy::new(|| {
    HolidaySetBuilder::new("German settlement")
        .fixed(1, 1, Observance::Actual)
        .easter(-2, 1970)
        .easter(1, 1970)
        .easter(39, 1970)
        .easter(50, 1970)
        .easter(60, 1970)
        .fixed(5, 1, Observance::Actual)
        .fixed_from(10, 3, 1990, Observance::Actual)
        .fixed(12, 24, Observance::Actual)
        .fixed(12, 25, Observance::Actual)
        .fixed(12, 26, Observance::Actual)
        .build()
});

static EXCHANGE: Lazy<HolidaySet> = Lazy::new(|| {
    HolidaySetBuilder::new("Frankfurt stock exchange")
        .fixed(1, 1, Observance::Actual)
        .easter(-2, 1970)
        .easter(1, 1970)
        .fixed(5, 1, Observance::Actual)
        .fixed(12, 24, Observance::Actual)
        .fixed(12, 25, Observance::Actual)
        .fixed(12, 26, Observance::Actual)
        .fixed(12, 31, Observance::Actual)
        .build()
});

/// German calendars.
///
/// Frankfurt and Xetra share the exchange holiday set; settlement adds the
/// church holidays and German Unity Day and keeps New Year's Eve open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Germany {
    market: GermanyMarket,
}

impl Germany {
    /// Creates the calendar for a market.
    #[must_use]
    pub fn new(market: GermanyMarket) -> Self {
        Self { market }
    }
}

impl Calendar for Germany {
    fn name(&self) -> &'static str {
        match self.market {
            GermanyMarket::Settlement => "German settlement",
            GermanyMarket::FrankfurtStockExchange => "Frankfurt stock exchange",
            GermanyMarket::Xetra => "Xetra",
        }
    }

    fn is_business_day(&self, date: Date) -> bool {
        let holidays = match self.market {
            GermanyMarket::Settlement => &*SETTLEMENT,
            GermanyMarket::FrankfurtStockExchange | GermanyMarket::Xetra => &*EXCHANGE,
        };
        !date.is_weekend() && !holidays.contains(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_settlement_church_holidays_2025() {
        let cal = Germany::default();
        // Ascension, Whit Monday, Corpus Christi
        assert!(!cal.is_business_day(d(2025, 5, 29)));
        assert!(!cal.is_business_day(d(2025, 6, 9)));
        assert!(!cal.is_business_day(d(2025, 6, 19)));
        assert!(!cal.is_business_day(d(2025, 10, 3)));
        assert!(cal.is_business_day(d(2025, 12, 31)));
    }

    #[test]
    fn test_exchange_calendars() {
        let xetra = Germany::new(GermanyMarket::Xetra);
        let frankfurt = Germany::new(GermanyMarket::FrankfurtStockExchange);
        assert!(xetra.is_business_day(d(2025, 5, 29)));
        assert!(!xetra.is_business_day(d(2025, 12, 31)));
        assert!(!frankfurt.is_business_day(d(2025, 12, 24)));
        assert_eq!(xetra.name(), "Xetra");
    }
}
