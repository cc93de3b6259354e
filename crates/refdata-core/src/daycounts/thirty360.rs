//! 30/360 day counts.

use super::DayCount;
use crate::types::Date;

fn is_last_day_of_february(date: Date) -> bool {
    date.month() == 2 && date.is_end_of_month()
}

fn thirty_360(start: Date, end: Date, d1: i64, d2: i64) -> i64 {
    let years = i64::from(end.year() - start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    360 * years + 30 * months + (d2 - d1)
}

/// 30/360 US (bond basis), with the February end-of-month rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360US;

impl DayCount for Thirty360US {
    fn name(&self) -> &'static str {
        "30/360 US"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let mut d1 = i64::from(start.day());
        let mut d2 = i64::from(end.day());
        let start_feb_eom = is_last_day_of_february(start);

        if start_feb_eom && is_last_day_of_february(end) {
            d2 = 30;
        }
        if start_feb_eom || d1 == 31 {
            d1 = 30;
        }
        if d2 == 31 && d1 >= 30 {
            d2 = 30;
        }
        thirty_360(start, end, d1, d2)
    }
}

/// 30E/360 (Eurobond basis).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360E;

impl DayCount for Thirty360E {
    fn name(&self) -> &'static str {
        "30E/360"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = i64::from(start.day()).min(30);
        let d2 = i64::from(end.day()).min(30);
        thirty_360(start, end, d1, d2)
    }
}

/// 30E/360 ISDA.
///
/// Month ends count as the 30th, except a February end date equal to the
/// termination date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thirty360EIsda {
    termination_date: Option<Date>,
}

impl Thirty360EIsda {
    /// Creates the convention with an optional termination (maturity) date.
    #[must_use]
    pub fn new(termination_date: Option<Date>) -> Self {
        Self { termination_date }
    }
}

impl DayCount for Thirty360EIsda {
    fn name(&self) -> &'static str {
        "30E/360 ISDA"
    }

    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.day_count(start, end) as f64 / 360.0
    }

    fn day_count(&self, start: Date, end: Date) -> i64 {
        let d1 = if start.is_end_of_month() {
            30
        } else {
            i64::from(start.day())
        };
        let is_termination = self.termination_date == Some(end);
        let d2 = if end.is_end_of_month() && !(is_termination && end.month() == 2) {
            30
        } else {
            i64::from(end.day())
        };
        thirty_360(start, end, d1, d2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_thirty360us_full_year() {
        assert_eq!(Thirty360US.day_count(d(2025, 1, 1), d(2026, 1, 1)), 360);
    }

    #[test]
    fn test_thirty360us_end_of_month_rules() {
        // D1 = 31 becomes 30, then D2 = 31 becomes 30
        assert_eq!(Thirty360US.day_count(d(2025, 1, 31), d(2025, 3, 31)), 60);
        // February end to February end
        assert_eq!(Thirty360US.day_count(d(2023, 2, 28), d(2024, 2, 29)), 360);
        // D2 = 31 with D1 < 30 stays 31
        assert_eq!(Thirty360US.day_count(d(2025, 1, 15), d(2025, 3, 31)), 76);
    }

    #[test]
    fn test_thirty360e() {
        assert_eq!(Thirty360E.day_count(d(2025, 1, 15), d(2025, 3, 31)), 75);
        assert_eq!(Thirty360E.day_count(d(2024, 2, 29), d(2024, 3, 31)), 31);
    }

    #[test]
    fn test_thirty360e_isda_february() {
        let dc = Thirty360EIsda::default();
        assert_eq!(dc.day_count(d(2024, 2, 29), d(2024, 3, 31)), 30);

        let with_maturity = Thirty360EIsda::new(Some(d(2025, 2, 28)));
        assert_eq!(with_maturity.day_count(d(2024, 8, 31), d(2025, 2, 28)), 178);
        assert_eq!(dc.day_count(d(2024, 8, 31), d(2025, 2, 28)), 180);
    }
}
