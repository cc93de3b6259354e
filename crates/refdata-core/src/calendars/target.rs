//! TARGET calendar for Eurozone settlement.

use once_cell::sync::Lazy;

use super::holidays::{HolidaySet, HolidaySetBuilder, Observance};
use super::Calendar;
use crate::types::Date;

static TARGET_HOLIDAYS: Lazy<HolidaySet> = Lazy::new(|| {
    HolidaySetBuilder::new("TARGET")
        .fixed(1, 1, Observance::Actual)
        .easter(-2, 2000)
        .easter(1, 2000)
        .fixed_from(5, 1, 2000, Observance::Actual)
        .fixed(12, 25, Observance::Actual)
        .fixed_from(12, 26, 2000, Observance::Actual)
        .date(1998, 12, 31)
        .date(1999, 12, 31)
        .date(2001, 12, 31)
        .build()
});

/// TARGET (Trans-European Automated Real-time Gross settlement Express Transfer).
///
/// Holidays: New Year's Day, Good Friday and Easter Monday (since 2000),
/// Labour Day (since 2000), Christmas, Boxing Day (since 2000), and
/// December 31st in 1998, 1999 and 2001. Weekend holidays are not moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target;

impl Calendar for Target {
    fn name(&self) -> &'static str {
        "TARGET"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend() && !TARGET_HOLIDAYS.contains(date)
    }
}
