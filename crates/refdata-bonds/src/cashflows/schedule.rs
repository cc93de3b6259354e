//! Coupon schedule generation.
//!
//! Dates are rolled backward from maturity in whole coupon tenors, so an
//! irregular period, if any, is a short front stub. No end-of-month rule is
//! applied; every date keeps the maturity's day of month (clamped to the
//! month length).

use refdata_core::calendars::{BusinessDayConvention, Calendar};
use refdata_core::types::Date;

use crate::error::{BondError, BondResult};

/// A coupon date schedule with unadjusted and adjusted dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    unadjusted_dates: Vec<Date>,
    adjusted_dates: Vec<Date>,
}

impl Schedule {
    /// Generates a schedule backward from `end` to `start`.
    ///
    /// # Errors
    ///
    /// Returns an error if `end` is not after `start`, the tenor is not
    /// positive, or a date cannot be adjusted.
    pub fn backward<C: Calendar + ?Sized>(
        start: Date,
        end: Date,
        months_per_period: i32,
        calendar: &C,
        convention: BusinessDayConvention,
    ) -> BondResult<Self> {
        if end <= start {
            return Err(BondError::invalid_parameters(
                "maturity_date",
                format!("schedule end {end} must be after start {start}"),
            ));
        }
        if months_per_period <= 0 {
            return Err(BondError::invalid_parameters(
                "coupon_frequency",
                format!("coupon tenor must be positive, got {months_per_period} months"),
            ));
        }

        let mut unadjusted = vec![end];
        let mut k = 1;
        loop {
            let date = end.add_months(-k * months_per_period)?;
            if date <= start {
                break;
            }
            unadjusted.push(date);
            k += 1;
        }
        unadjusted.push(start);
        unadjusted.reverse();

        let adjusted = unadjusted
            .iter()
            .map(|&date| calendar.adjust(date, convention))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            unadjusted_dates: unadjusted,
            adjusted_dates: adjusted,
        })
    }

    /// Unadjusted schedule dates, start included.
    #[must_use]
    pub fn unadjusted_dates(&self) -> &[Date] {
        &self.unadjusted_dates
    }

    /// Business-day adjusted schedule dates, start included.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.adjusted_dates
    }

    /// Number of coupon periods.
    #[must_use]
    pub fn period_count(&self) -> usize {
        self.adjusted_dates.len().saturating_sub(1)
    }

    /// Adjusted `(start, end)` pairs, one per coupon period.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.adjusted_dates.windows(2).map(|w| (w[0], w[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdata_core::calendars::{NullCalendar, Target};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_semiannual_five_years() {
        let schedule = Schedule::backward(
            d(2023, 1, 1),
            d(2028, 1, 1),
            6,
            &Target,
            BusinessDayConvention::Following,
        )
        .unwrap();
        assert_eq!(schedule.period_count(), 10);
        assert_eq!(schedule.unadjusted_dates()[1], d(2023, 7, 1));
        // 2028-01-01 is a Saturday and a TARGET holiday
        assert_eq!(*schedule.dates().last().unwrap(), d(2028, 1, 3));
        assert_eq!(schedule.dates()[0], d(2023, 1, 2));
    }

    #[test]
    fn test_short_front_stub() {
        let schedule = Schedule::backward(
            d(2023, 3, 15),
            d(2025, 1, 10),
            12,
            &NullCalendar,
            BusinessDayConvention::Unadjusted,
        )
        .unwrap();
        assert_eq!(
            schedule.dates(),
            &[d(2023, 3, 15), d(2024, 1, 10), d(2025, 1, 10)]
        );
    }

    #[test]
    fn test_month_end_does_not_drift() {
        let schedule = Schedule::backward(
            d(2023, 8, 31),
            d(2024, 8, 31),
            3,
            &NullCalendar,
            BusinessDayConvention::Unadjusted,
        )
        .unwrap();
        assert_eq!(
            schedule.unadjusted_dates(),
            &[d(2023, 8, 31), d(2023, 11, 30), d(2024, 2, 29), d(2024, 5, 31), d(2024, 8, 31)]
        );
    }

    #[test]
    fn test_rejects_inverted_dates() {
        assert!(Schedule::backward(
            d(2025, 1, 1),
            d(2024, 1, 1),
            6,
            &NullCalendar,
            BusinessDayConvention::Following
        )
        .is_err());
    }
}
