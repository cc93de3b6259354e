//! United Kingdom calendars.

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::holidays::{HolidaySet, HolidaySetBuilder, Observance};
use super::Calendar;
use crate::types::Date;

/// UK market variants. All three follow the bank holiday schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UkMarket {
    /// Generic settlement calendar.
    #[default]
    Settlement,
    /// London Stock Exchange.
    Exchange,
    /// London Metals Exchange.
    Metals,
}

/// Christmas and Boxing Day with their weekday substitutes.
fn christmas_substitutes(year: i32) -> Vec<NaiveDate> {
    let Some(christmas) = NaiveDate::from_ymd_opt(year, 12, 25) else {
        return Vec::new();
    };
    let extra: &[u32] = match christmas.weekday() {
        Weekday::Fri => &[28],
        Weekday::Sat => &[27, 28],
        Weekday::Sun => &[27],
        _ => &[],
    };
    [25, 26]
        .iter()
        .chain(extra)
        .filter_map(|&day| NaiveDate::from_ymd_opt(year, 12, day))
        .collect()
}

static BANK_HOLIDAYS: Lazy<HolidaySet> = Lazy::new(|| {
    HolidaySetBuilder::new("UK")
        .fixed(1, 1, Observance::NextMonday)
        .easter(-2, 1970)
        .easter(1, 1970)
        .nth_weekday(5, Weekday::Mon, 1, 1978)
        .last_weekday(5, Weekday::Mon)
        .last_weekday(8, Weekday::Mon)
        .custom(christmas_substitutes)
        // moved early May bank holidays
        .remove(1995, 5, 1)
        .date(1995, 5, 8)
        .remove(2020, 5, 4)
        .date(2020, 5, 8)
        // moved spring bank holidays
        .remove(2002, 5, 27)
        .date(2002, 6, 4)
        .remove(2012, 5, 28)
        .date(2012, 6, 4)
        .remove(2022, 5, 30)
        .date(2022, 6, 2)
        // one-off bank holidays
        .date(1999, 12, 31)
        .date(2002, 6, 3)
        .date(2011, 4, 29)
        .date(2012, 6, 5)
        .date(2022, 6, 3)
        .date(2022, 9, 19)
        .date(2023, 5, 8)
        .build()
});

/// United Kingdom calendars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitedKingdom {
    market: UkMarket,
}

impl UnitedKingdom {
    /// Creates the calendar for a market.
    #[must_use]
    pub fn new(market: UkMarket) -> Self {
        Self { market }
    }

    /// Returns the market variant.
    #[must_use]
    pub fn market(&self) -> UkMarket {
        self.market
    }
}

impl Calendar for UnitedKingdom {
    fn name(&self) -> &'static str {
        match self.market {
            UkMarket::Settlement => "UK settlement",
            UkMarket::Exchange => "London stock exchange",
            UkMarket::Metals => "London metals exchange",
        }
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !BANK_HOLIDAYS.contains(date)
    }
}
