//! Discount curves used by the analytics engines.
//!
//! - [`DiscountCurve`]: discount factors, zero and forward rates off a reference date
//! - [`FlatForwardCurve`]: a single rate held in a shared [`RateQuote`]
//! - [`KeyRateBump`] / [`KeyRateBumpedCurve`]: triangular shifts for key-rate durations

mod flat_forward;
mod key_rate;

pub use flat_forward::{FlatForwardCurve, RateQuote};
pub use key_rate::{KeyRateBump, KeyRateBumpedCurve, DEFAULT_KEY_TENORS};

use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::{Compounding, Date, Frequency, InterestRate};

use crate::error::BondResult;

/// Smallest time used when a zero rate is requested at the reference date.
const MIN_TIME: f64 = 1.0 / 365.0;

/// A discounting term structure anchored at a reference date.
pub trait DiscountCurve: Send + Sync {
    /// Valuation date of the curve.
    fn reference_date(&self) -> Date;

    /// Day count used to turn dates into curve times.
    fn day_count(&self) -> DayCountConvention;

    /// Discount factor from the reference date to time `t` (years).
    fn discount_factor(&self, t: f64) -> f64;

    /// Curve time of a date.
    fn time_to(&self, date: Date) -> f64 {
        self.day_count().year_fraction(self.reference_date(), date)
    }

    /// Discount factor from the reference date to `date`.
    fn discount(&self, date: Date) -> f64 {
        self.discount_factor(self.time_to(date))
    }

    /// Zero rate to `date` expressed in the given conventions.
    fn zero_rate(
        &self,
        date: Date,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> BondResult<InterestRate> {
        let curve_time = self.time_to(date).max(MIN_TIME);
        let compound = 1.0 / self.discount_factor(curve_time);
        let t = if date > self.reference_date() {
            day_count.year_fraction(self.reference_date(), date)
        } else {
            curve_time
        };
        Ok(InterestRate::implied_rate(
            compound,
            t.max(MIN_TIME),
            day_count,
            compounding,
            frequency,
        )?)
    }

    /// Simple forward rate between two dates, accrued with `day_count`.
    fn forward_rate(&self, start: Date, end: Date, day_count: DayCountConvention) -> f64 {
        let tau = day_count.year_fraction(start, end);
        if tau <= 0.0 {
            return 0.0;
        }
        (self.discount(start) / self.discount(end) - 1.0) / tau
    }
}
