//! Rule-based holiday sets.
//!
//! Calendars describe their holidays as rules (fixed dates with weekend
//! observance, nth weekdays, Easter offsets) which are expanded once over
//! [`MIN_YEAR`]..=[`MAX_YEAR`] into a set of dates.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::types::Date;

/// First year for which holidays are generated.
pub const MIN_YEAR: i32 = 1970;
/// Last year for which holidays are generated.
pub const MAX_YEAR: i32 = 2100;

/// How a fixed-date holiday moves when it falls on a weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observance {
    /// Never moved.
    Actual,
    /// Saturday to Friday, Sunday to Monday.
    NearestWeekday,
    /// Sunday to Monday, Saturday not observed.
    SundayToMonday,
    /// Saturday or Sunday to the following Monday.
    NextMonday,
}

impl Observance {
    fn apply(self, date: NaiveDate) -> NaiveDate {
        let shift = match (self, date.weekday()) {
            (Observance::NearestWeekday, Weekday::Sat) => -1,
            (Observance::NearestWeekday | Observance::SundayToMonday, Weekday::Sun) => 1,
            (Observance::NextMonday, Weekday::Sat) => 2,
            (Observance::NextMonday, Weekday::Sun) => 1,
            _ => 0,
        };
        date + Duration::days(shift)
    }
}

/// Expanded set of holiday dates for one calendar.
#[derive(Debug, Clone)]
pub struct HolidaySet {
    name: &'static str,
    dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    /// Returns the calendar name the set was built for.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if the date is a listed holiday (weekends are not included).
    pub fn contains(&self, date: Date) -> bool {
        self.dates.contains(&date.as_naive_date())
    }

    /// Number of holiday dates in the set.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the set has no holidays.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Builder for [`HolidaySet`].
pub struct HolidaySetBuilder {
    name: &'static str,
    dates: HashSet<NaiveDate>,
}

impl HolidaySetBuilder {
    /// Creates an empty builder.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            dates: HashSet::new(),
        }
    }

    fn years(from_year: i32) -> std::ops::RangeInclusive<i32> {
        from_year.max(MIN_YEAR)..=MAX_YEAR
    }

    /// Same month/day every year.
    pub fn fixed(self, month: u32, day: u32, observance: Observance) -> Self {
        self.fixed_between(month, day, MIN_YEAR, MAX_YEAR, observance)
    }

    /// Same month/day every year from `from_year` on.
    pub fn fixed_from(self, month: u32, day: u32, from_year: i32, observance: Observance) -> Self {
        self.fixed_between(month, day, from_year, MAX_YEAR, observance)
    }

    /// Same month/day for the years in `from_year..=to_year`.
    pub fn fixed_between(
        mut self,
        month: u32,
        day: u32,
        from_year: i32,
        to_year: i32,
        observance: Observance,
    ) -> Self {
        for year in from_year.max(MIN_YEAR)..=to_year.min(MAX_YEAR) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                self.dates.insert(observance.apply(date));
            }
        }
        self
    }

    /// The `n`th `weekday` of `month`, from `from_year` on.
    pub fn nth_weekday(mut self, month: u32, weekday: Weekday, n: u32, from_year: i32) -> Self {
        for year in Self::years(from_year) {
            if let Some(date) = nth_weekday_of_month(year, month, weekday, n) {
                self.dates.insert(date);
            }
        }
        self
    }

    /// The last `weekday` of `month`, every year.
    pub fn last_weekday(mut self, month: u32, weekday: Weekday) -> Self {
        for year in Self::years(MIN_YEAR) {
            if let Some(date) = last_weekday_of_month(year, month, weekday) {
                self.dates.insert(date);
            }
        }
        self
    }

    /// Easter Sunday plus `offset` days, from `from_year` on.
    pub fn easter(mut self, offset: i64, from_year: i32) -> Self {
        for year in Self::years(from_year) {
            if let Some(easter) = easter_sunday(year) {
                self.dates.insert(easter + Duration::days(offset));
            }
        }
        self
    }

    /// A one-off date.
    pub fn date(mut self, year: i32, month: u32, day: u32) -> Self {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.dates.insert(date);
        }
        self
    }

    /// Removes a date added by an earlier rule (moved holidays).
    pub fn remove(mut self, year: i32, month: u32, day: u32) -> Self {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.dates.remove(&date);
        }
        self
    }

    /// Holidays produced per year by a custom rule.
    pub fn custom<F>(mut self, rule: F) -> Self
    where
        F: Fn(i32) -> Vec<NaiveDate>,
    {
        for year in Self::years(MIN_YEAR) {
            self.dates.extend(rule(year));
        }
        self
    }

    /// Finishes the set.
    pub fn build(self) -> HolidaySet {
        HolidaySet {
            name: self.name,
            dates: self.dates,
        }
    }
}

/// The `n`th occurrence of a weekday in a month.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (i64::from(weekday.num_days_from_monday())
        - i64::from(first.weekday().num_days_from_monday()))
    .rem_euclid(7);
    let date = first + Duration::days(offset + 7 * i64::from(n.checked_sub(1)?));
    (date.month() == month).then_some(date)
}

/// The last occurrence of a weekday in a month.
pub fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_first.pred_opt()?;
    let back = (i64::from(last.weekday().num_days_from_monday())
        - i64::from(weekday.num_days_from_monday()))
    .rem_euclid(7);
    Some(last - Duration::days(back))
}

/// Easter Sunday (Anonymous Gregorian algorithm).
#[allow(clippy::many_single_char_names)]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = ((h + l - 7 * m + 114) % 31) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_easter() {
        assert_eq!(easter_sunday(2024), Some(nd(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(nd(2025, 4, 20)));
        assert_eq!(easter_sunday(2030), Some(nd(2030, 4, 21)));
    }

    #[test]
    fn test_nth_and_last_weekday() {
        assert_eq!(
            nth_weekday_of_month(2025, 1, Weekday::Mon, 3),
            Some(nd(2025, 1, 20))
        );
        assert_eq!(nth_weekday_of_month(2025, 3, Weekday::Mon, 5), Some(nd(2025, 3, 31)));
        assert_eq!(nth_weekday_of_month(2025, 2, Weekday::Mon, 5), None);
        assert_eq!(
            last_weekday_of_month(2025, 5, Weekday::Mon),
            Some(nd(2025, 5, 26))
        );
        assert_eq!(
            last_weekday_of_month(2025, 12, Weekday::Wed),
            Some(nd(2025, 12, 31))
        );
    }

    #[test]
    fn test_observance() {
        // 2026-07-04 is a Saturday, 2027-07-04 a Sunday
        assert_eq!(Observance::NearestWeekday.apply(nd(2026, 7, 4)), nd(2026, 7, 3));
        assert_eq!(Observance::NearestWeekday.apply(nd(2027, 7, 4)), nd(2027, 7, 5));
        assert_eq!(Observance::SundayToMonday.apply(nd(2026, 7, 4)), nd(2026, 7, 4));
        assert_eq!(Observance::NextMonday.apply(nd(2026, 7, 4)), nd(2026, 7, 6));
    }

    #[test]
    fn test_builder_remove() {
        let set = HolidaySetBuilder::new("Test")
            .fixed(1, 1, Observance::Actual)
            .remove(2025, 1, 1)
            .build();
        assert!(!set.contains(Date::from_ymd(2025, 1, 1).unwrap()));
        assert!(set.contains(Date::from_ymd(2026, 1, 1).unwrap()));
        assert_eq!(set.name(), "Test");
    }
}
