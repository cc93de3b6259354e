//! Business/252 day count.

use super::DayCount;
use crate::calendars::Calendar;
use crate::types::Date;

/// Business days over a 252-day year, counted on a holiday calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Business252<C> {
    calendar: C,
}

impl<C: Calendar> Business252<C> {
    /// Creates the convention for a calendar.
    #[must_use]
    pub fn new(calendar: C) -> Self {
        Self { calendar }
    }
}

impl<C: Calendar> DayCount for Business252<C> {
    fn name(&self) -> &'static str {
        "BUS/252"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 252.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        if end >= start {
            i64::from(self.calendar.business_days_between(start, end))
        } else {
            -i64::from(self.calendar.business_days_between(end, start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::{Target, WeekendsOnly};

    #[test]
    fn test_business252_week() {
        let dc = Business252::new(WeekendsOnly);
        let monday = Date::from_ymd(2025, 1, 6).unwrap();
        let next_monday = Date::from_ymd(2025, 1, 13).unwrap();
        assert_eq!(dc.day_count(monday, next_monday), 5);
        assert!((dc.year_fraction(monday, next_monday) - 5.0 / 252.0).abs() < 1e-15);
        assert_eq!(dc.day_count(next_monday, monday), -5);
    }

    #[test]
    fn test_business252_skips_target_holidays() {
        let dc = Business252::new(Target);
        // Dec 24 2024 (Tue) to Dec 31 2024 (Tue): Dec 25/26 are TARGET holidays
        let start = Date::from_ymd(2024, 12, 24).unwrap();
        let end = Date::from_ymd(2024, 12, 31).unwrap();
        assert_eq!(dc.day_count(start, end), 3);
    }
}
