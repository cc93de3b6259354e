//! Actual-day day counts.

use super::DayCount;
use crate::types::Date;

/// Actual/360.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act360;

impl DayCount for Act360 {
    fn name(&self) -> &'static str {
        "ACT/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/365 Fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Act365Fixed;

impl DayCount for Act365Fixed {
    fn name(&self) -> &'static str {
        "ACT/365F"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 365.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}

/// Actual/Actual ISDA.
///
/// Days falling in leap years count over 366, the rest over 365.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActActIsda;

impl DayCount for ActActIsda {
    fn name(&self) -> &'static str {
        "ACT/ACT ISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        if start == end {
            return 0.0;
        }
        if start > end {
            return -self.year_fraction(end, start);
        }

        let y1 = start.year();
        let y2 = end.year();
        let basis = |year: i32| -> f64 {
            if chrono::NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                366.0
            } else {
                365.0
            }
        };

        if y1 == y2 {
            return start.days_between(&end) as f64 / basis(y1);
        }

        // year boundaries always exist in chrono's range for dates we were given
        let start_next = chrono::NaiveDate::from_ymd_opt(y1 + 1, 1, 1).map(Date::from);
        let end_first = chrono::NaiveDate::from_ymd_opt(y2, 1, 1).map(Date::from);
        match (start_next, end_first) {
            (Some(a), Some(b)) => {
                start.days_between(&a) as f64 / basis(y1)
                    + f64::from(y2 - y1 - 1)
                    + b.days_between(&end) as f64 / basis(y2)
            }
            _ => start.days_between(&end) as f64 / 365.0,
        }
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        start.days_between(&end)
    }
}
