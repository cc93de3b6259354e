//! Business day calendars and conventions.
//!
//! This module provides:
//! - The [`Calendar`] trait with date rolling and business-day arithmetic
//! - Market calendars: [`Target`], [`UnitedStates`], [`UnitedKingdom`], [`Germany`]
//! - [`NullCalendar`] (every day is a business day) and [`WeekendsOnly`]
//! - Business day adjustment conventions

mod conventions;
mod germany;
pub mod holidays;
mod target;
mod united_kingdom;
mod united_states;

pub use conventions::{adjust, BusinessDayConvention};
pub use germany::{Germany, GermanyMarket};
pub use target::Target;
pub use united_kingdom::{UkMarket, UnitedKingdom};
pub use united_states::{UnitedStates, UsMarket};

use crate::error::CoreResult;
use crate::types::{Date, Period, TimeUnit};

/// A business day calendar for a market or jurisdiction.
pub trait Calendar: Send + Sync {
    /// Returns the name of the calendar.
    fn name(&self) -> &'static str;

    /// Returns true if the date is a business day.
    fn is_business_day(&self, date: Date) -> bool;

    /// Returns true if the date is a holiday or weekend.
    fn is_holiday(&self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Adjusts a date according to the given business day convention.
    fn adjust(&self, date: Date, convention: BusinessDayConvention) -> CoreResult<Date> {
        conventions::adjust(date, convention, self)
    }

    /// Moves a date by `days` business days.
    ///
    /// A zero count returns the date adjusted forward to a business day.
    fn advance_business_days(&self, date: Date, days: i32) -> CoreResult<Date> {
        if days == 0 {
            return conventions::roll(date, 1, self);
        }
        let direction: i64 = if days > 0 { 1 } else { -1 };
        let mut result = date;
        for _ in 0..days.unsigned_abs() {
            result = conventions::roll(result.add_days(direction), direction, self)?;
        }
        Ok(result)
    }

    /// Moves a date by a period.
    ///
    /// Day periods count business days; week, month and year periods move on
    /// the calendar and then adjust with `convention`.
    fn advance(
        &self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
    ) -> CoreResult<Date> {
        match period.unit() {
            TimeUnit::Days => self.advance_business_days(date, period.length()),
            _ => self.adjust(date.add_period(period)?, convention),
        }
    }

    /// Returns the next business day on or after the given date.
    fn next_business_day(&self, date: Date) -> CoreResult<Date> {
        conventions::roll(date, 1, self)
    }

    /// Returns the previous business day on or before the given date.
    fn previous_business_day(&self, date: Date) -> CoreResult<Date> {
        conventions::roll(date, -1, self)
    }

    /// Counts business days in `(start, end]`.
    fn business_days_between(&self, start: Date, end: Date) -> i32 {
        let mut count = 0;
        let mut current = start.add_days(1);
        while current <= end {
            if self.is_business_day(current) {
                count += 1;
            }
            current = current.add_days(1);
        }
        count
    }
}

impl<C: Calendar + ?Sized> Calendar for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_business_day(&self, date: Date) -> bool {
        (**self).is_business_day(date)
    }
}

/// Calendar with no holidays and no weekends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCalendar;

impl Calendar for NullCalendar {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn is_business_day(&self, _date: Date) -> bool {
        true
    }
}

/// Saturday/Sunday weekends, no holidays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekendsOnly;

impl Calendar for WeekendsOnly {
    fn name(&self) -> &'static str {
        "Weekends only"
    }

    fn is_business_day(&self, date: Date) -> bool {
        !date.is_weekend()
    }
}

/// Calendar that is open only when every member calendar is open.
pub struct JointCalendar {
    calendars: Vec<Box<dyn Calendar>>,
}

impl JointCalendar {
    /// Creates a joint calendar.
    pub fn new(calendars: Vec<Box<dyn Calendar>>) -> Self {
        Self { calendars }
    }

    /// Names of the member calendars.
    pub fn member_names(&self) -> Vec<&'static str> {
        self.calendars.iter().map(|c| c.name()).collect()
    }
}

impl Calendar for JointCalendar {
    fn name(&self) -> &'static str {
        "Joint"
    }

    fn is_business_day(&self, date: Date) -> bool {
        self.calendars.iter().all(|cal| cal.is_business_day(date))
    }
}
