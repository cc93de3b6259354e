//! Business day adjustment conventions.

use serde::{Deserialize, Serialize};

use super::Calendar;
use crate::error::{CoreError, CoreResult};
use crate::types::Date;

/// Longest run of non-business days tolerated before an adjustment gives up.
const MAX_ROLL_DAYS: i64 = 366;

/// How a date falling on a non-business day is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BusinessDayConvention {
    /// Keep the date as-is.
    Unadjusted,

    /// First business day after.
    #[default]
    Following,

    /// Following, unless that crosses into the next month, then preceding.
    ModifiedFollowing,

    /// First business day before.
    Preceding,

    /// Preceding, unless that crosses into the previous month, then following.
    ModifiedPreceding,

    /// Modified following, also rolling back if following crosses the 15th.
    HalfMonthModifiedFollowing,

    /// Closest business day; ties go forward.
    Nearest,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BusinessDayConvention::Unadjusted => "Unadjusted",
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "Modified Preceding",
            BusinessDayConvention::HalfMonthModifiedFollowing => "Half-Month Modified Following",
            BusinessDayConvention::Nearest => "Nearest",
        };
        write!(f, "{name}")
    }
}

/// Adjusts a date according to the given business day convention.
///
/// # Errors
///
/// Returns `CoreError::Calendar` if no business day is found within a year
/// of the date.
pub fn adjust<C: Calendar + ?Sized>(
    date: Date,
    convention: BusinessDayConvention,
    calendar: &C,
) -> CoreResult<Date> {
    if convention == BusinessDayConvention::Unadjusted || calendar.is_business_day(date) {
        return Ok(date);
    }

    match convention {
        BusinessDayConvention::Unadjusted => Ok(date),
        BusinessDayConvention::Following => roll(date, 1, calendar),
        BusinessDayConvention::Preceding => roll(date, -1, calendar),
        BusinessDayConvention::ModifiedFollowing => {
            let adjusted = roll(date, 1, calendar)?;
            if adjusted.month() != date.month() {
                roll(date, -1, calendar)
            } else {
                Ok(adjusted)
            }
        }
        BusinessDayConvention::ModifiedPreceding => {
            let adjusted = roll(date, -1, calendar)?;
            if adjusted.month() != date.month() {
                roll(date, 1, calendar)
            } else {
                Ok(adjusted)
            }
        }
        BusinessDayConvention::HalfMonthModifiedFollowing => {
            let adjusted = roll(date, 1, calendar)?;
            let crosses_mid_month = date.day() <= 15 && adjusted.day() > 15;
            if adjusted.month() != date.month() || crosses_mid_month {
                roll(date, -1, calendar)
            } else {
                Ok(adjusted)
            }
        }
        BusinessDayConvention::Nearest => {
            let forward = roll(date, 1, calendar)?;
            let backward = roll(date, -1, calendar)?;
            if date.days_between(&forward) <= backward.days_between(&date) {
                Ok(forward)
            } else {
                Ok(backward)
            }
        }
    }
}

/// First business day at or beyond `date` in `direction` (+1 or -1).
pub(crate) fn roll<C: Calendar + ?Sized>(date: Date, direction: i64, calendar: &C) -> CoreResult<Date> {
    let mut current = date;
    for _ in 0..=MAX_ROLL_DAYS {
        if calendar.is_business_day(current) {
            return Ok(current);
        }
        current = current.add_days(direction);
    }
    Err(CoreError::calendar(format!(
        "no business day within {MAX_ROLL_DAYS} days of {date} on {}",
        calendar.name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendars::{NullCalendar, WeekendsOnly};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_following_and_preceding() {
        let saturday = d(2025, 1, 4);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Following, &WeekendsOnly).unwrap(),
            d(2025, 1, 6)
        );
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Preceding, &WeekendsOnly).unwrap(),
            d(2025, 1, 3)
        );
    }

    #[test]
    fn test_modified_following_month_end() {
        // Saturday 2025-05-31 would roll into June
        let adjusted =
            adjust(d(2025, 5, 31), BusinessDayConvention::ModifiedFollowing, &WeekendsOnly).unwrap();
        assert_eq!(adjusted, d(2025, 5, 30));
    }

    #[test]
    fn test_modified_preceding_month_start() {
        // Saturday 2025-03-01 would roll into February
        let adjusted =
            adjust(d(2025, 3, 1), BusinessDayConvention::ModifiedPreceding, &WeekendsOnly).unwrap();
        assert_eq!(adjusted, d(2025, 3, 3));
    }

    #[test]
    fn test_half_month_modified_following() {
        // Saturday 2025-03-15 would roll past the 15th
        let adjusted = adjust(
            d(2025, 3, 15),
            BusinessDayConvention::HalfMonthModifiedFollowing,
            &WeekendsOnly,
        )
        .unwrap();
        assert_eq!(adjusted, d(2025, 3, 14));
    }

    #[test]
    fn test_nearest() {
        assert_eq!(
            adjust(d(2025, 1, 4), BusinessDayConvention::Nearest, &WeekendsOnly).unwrap(),
            d(2025, 1, 3)
        );
        assert_eq!(
            adjust(d(2025, 1, 5), BusinessDayConvention::Nearest, &WeekendsOnly).unwrap(),
            d(2025, 1, 6)
        );
    }

    #[test]
    fn test_unadjusted_and_null_calendar() {
        let saturday = d(2025, 1, 4);
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Unadjusted, &WeekendsOnly).unwrap(),
            saturday
        );
        assert_eq!(
            adjust(saturday, BusinessDayConvention::Following, &NullCalendar).unwrap(),
            saturday
        );
    }
}
