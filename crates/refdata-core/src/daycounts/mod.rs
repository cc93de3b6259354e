//! Day count conventions.
//!
//! A day count turns a pair of dates into a year fraction for accrual and
//! discounting.
//!
//! - [`Act360`], [`Act365Fixed`], [`ActActIsda`]: actual-day numerators
//! - [`Thirty360US`], [`Thirty360E`], [`Thirty360EIsda`]: 30-day months
//! - [`Business252`]: business days over a 252-day year, for a given calendar
//!
//! ```rust
//! use refdata_core::daycounts::{DayCount, Thirty360US};
//! use refdata_core::types::Date;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//! assert_eq!(Thirty360US.day_count(start, end), 180);
//! assert!((Thirty360US.year_fraction(start, end) - 0.5).abs() < 1e-15);
//! ```

mod actual;
mod business252;
mod thirty360;

pub use actual::{Act360, Act365Fixed, ActActIsda};
pub use business252::Business252;
pub use thirty360::{Thirty360E, Thirty360EIsda, Thirty360US};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::calendars::Target;
use crate::error::CoreError;
use crate::types::Date;

/// A day count convention.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait DayCount: Send + Sync {
    /// Returns the name of the convention (e.g. "ACT/360").
    fn name(&self) -> &'static str;

    /// Year fraction between two dates. Negative if `end < start`.
    fn year_fraction(&self, start: Date, end: Date) -> f64;

    /// Number of days between two dates under the convention.
    fn day_count(&self, start: Date, end: Date) -> i64;
}

/// Runtime selector for the supported day counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DayCountConvention {
    /// Actual/360.
    Act360,
    /// Actual/365 Fixed.
    #[default]
    Act365Fixed,
    /// Actual/Actual ISDA.
    ActActIsda,
    /// 30/360 US (bond basis).
    Thirty360US,
    /// 30E/360 (Eurobond basis).
    Thirty360E,
    /// 30E/360 ISDA.
    Thirty360EIsda,
    /// Business/252 on the TARGET calendar.
    Business252,
}

impl DayCountConvention {
    /// Creates a boxed day count implementation.
    #[must_use]
    pub fn to_day_count(&self) -> Box<dyn DayCount> {
        match self {
            DayCountConvention::Act360 => Box::new(Act360),
            DayCountConvention::Act365Fixed => Box::new(Act365Fixed),
            DayCountConvention::ActActIsda => Box::new(ActActIsda),
            DayCountConvention::Thirty360US => Box::new(Thirty360US),
            DayCountConvention::Thirty360E => Box::new(Thirty360E),
            DayCountConvention::Thirty360EIsda => Box::new(Thirty360EIsda::default()),
            DayCountConvention::Business252 => Box::new(Business252::new(Target)),
        }
    }

    /// Year fraction under this convention.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        self.to_day_count().year_fraction(start, end)
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Act360 => "ACT/360",
            DayCountConvention::Act365Fixed => "ACT/365F",
            DayCountConvention::ActActIsda => "ACT/ACT ISDA",
            DayCountConvention::Thirty360US => "30/360 US",
            DayCountConvention::Thirty360E => "30E/360",
            DayCountConvention::Thirty360EIsda => "30E/360 ISDA",
            DayCountConvention::Business252 => "BUS/252",
        }
    }

    /// Returns all supported conventions.
    #[must_use]
    pub fn all() -> &'static [DayCountConvention] {
        &[
            DayCountConvention::Act360,
            DayCountConvention::Act365Fixed,
            DayCountConvention::ActActIsda,
            DayCountConvention::Thirty360US,
            DayCountConvention::Thirty360E,
            DayCountConvention::Thirty360EIsda,
            DayCountConvention::Business252,
        ]
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DayCountConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "ACT/360" | "ACTUAL/360" | "A/360" => Ok(DayCountConvention::Act360),
            "ACT/365F" | "ACT/365FIXED" | "ACTUAL/365FIXED" | "A/365F" => {
                Ok(DayCountConvention::Act365Fixed)
            }
            "ACT/ACT" | "ACT/ACTISDA" | "ACTUAL/ACTUAL" => Ok(DayCountConvention::ActActIsda),
            "30/360" | "30/360US" | "30U/360" => Ok(DayCountConvention::Thirty360US),
            "30E/360" | "30/360E" => Ok(DayCountConvention::Thirty360E),
            "30E/360ISDA" => Ok(DayCountConvention::Thirty360EIsda),
            "BUS/252" | "BUSINESS/252" => Ok(DayCountConvention::Business252),
            _ => Err(CoreError::parse("day count", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convention_round_trip_by_name() {
        for dc in DayCountConvention::all() {
            let parsed: DayCountConvention = dc.name().parse().unwrap();
            assert_eq!(parsed, *dc);
            assert_eq!(dc.to_day_count().name(), dc.name());
        }
    }

    #[test]
    fn test_unknown_convention() {
        assert!("ACT/364".parse::<DayCountConvention>().is_err());
    }
}
