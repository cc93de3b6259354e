//! Interest rate with its compounding convention.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::date::Date;
use super::frequency::{Compounding, Frequency};
use crate::daycounts::DayCountConvention;
use crate::error::{CoreError, CoreResult};

/// A rate together with the day count, compounding and frequency that give it meaning.
///
/// # Example
///
/// ```rust
/// use refdata_core::types::{Compounding, Frequency, InterestRate};
/// use refdata_core::daycounts::DayCountConvention;
///
/// let rate = InterestRate::new(
///     0.05,
///     DayCountConvention::Act365Fixed,
///     Compounding::Compounded,
///     Frequency::Annual,
/// )
/// .unwrap();
/// let df = rate.discount_factor(2.0);
/// assert!((df - 1.0 / 1.1025).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterestRate {
    rate: f64,
    day_count: DayCountConvention,
    compounding: Compounding,
    frequency: Frequency,
}

impl InterestRate {
    /// Creates a new interest rate.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRate` when a compounded rule is paired with a
    /// non-periodic frequency or the rate is not finite.
    pub fn new(
        rate: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CoreResult<Self> {
        if !rate.is_finite() {
            return Err(CoreError::invalid_rate(format!("rate {rate} is not finite")));
        }
        if compounding.requires_frequency() && !frequency.is_periodic() {
            return Err(CoreError::invalid_rate(format!(
                "{compounding} compounding needs a periodic frequency, got {frequency}"
            )));
        }
        Ok(Self {
            rate,
            day_count,
            compounding,
            frequency,
        })
    }

    /// Returns the rate value.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns the day count used to measure time.
    #[must_use]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Returns the compounding rule.
    #[must_use]
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// Returns the compounding frequency.
    #[must_use]
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Same conventions, different rate value.
    #[must_use]
    pub fn with_rate(&self, rate: f64) -> Self {
        Self { rate, ..*self }
    }

    fn f(&self) -> f64 {
        f64::from(self.frequency.periods_per_year())
    }

    fn regime(&self, t: f64) -> Compounding {
        match self.compounding {
            Compounding::SimpleThenCompounded if t <= 1.0 / self.f() => Compounding::Simple,
            Compounding::SimpleThenCompounded => Compounding::Compounded,
            Compounding::CompoundedThenSimple if t <= 1.0 / self.f() => Compounding::Compounded,
            Compounding::CompoundedThenSimple => Compounding::Simple,
            other => other,
        }
    }

    /// Growth of one unit over `t` years.
    #[must_use]
    pub fn compound_factor(&self, t: f64) -> f64 {
        let r = self.rate;
        match self.regime(t) {
            Compounding::Simple => 1.0 + r * t,
            Compounding::Continuous => (r * t).exp(),
            _ => {
                let f = self.f();
                (1.0 + r / f).powf(f * t)
            }
        }
    }

    /// Growth of one unit between two dates measured with the rate's day count.
    #[must_use]
    pub fn compound_factor_between(&self, start: Date, end: Date) -> f64 {
        let t = self.day_count.to_day_count().year_fraction(start, end);
        self.compound_factor(t)
    }

    /// Present value of one unit paid in `t` years.
    #[must_use]
    pub fn discount_factor(&self, t: f64) -> f64 {
        1.0 / self.compound_factor(t)
    }

    /// First derivative of the discount factor with respect to the rate.
    #[must_use]
    pub fn discount_factor_derivative(&self, t: f64) -> f64 {
        let r = self.rate;
        match self.regime(t) {
            Compounding::Simple => -t / (1.0 + r * t).powi(2),
            Compounding::Continuous => -t * (-r * t).exp(),
            _ => {
                let f = self.f();
                -t * (1.0 + r / f).powf(-f * t - 1.0)
            }
        }
    }

    /// Second derivative of the discount factor with respect to the rate.
    #[must_use]
    pub fn discount_factor_second_derivative(&self, t: f64) -> f64 {
        let r = self.rate;
        match self.regime(t) {
            Compounding::Simple => 2.0 * t * t / (1.0 + r * t).powi(3),
            Compounding::Continuous => t * t * (-r * t).exp(),
            _ => {
                let f = self.f();
                t * (f * t + 1.0) / f * (1.0 + r / f).powf(-f * t - 2.0)
            }
        }
    }

    /// Rate that produces the compound factor `compound` over `t` years.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRate` for a non-positive compound factor, a
    /// non-positive time with a compound factor other than one, or invalid conventions.
    pub fn implied_rate(
        compound: f64,
        t: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CoreResult<Self> {
        if compound <= 0.0 {
            return Err(CoreError::invalid_rate(format!(
                "compound factor {compound} must be positive"
            )));
        }
        let template = Self::new(0.0, day_count, compounding, frequency)?;
        if (compound - 1.0).abs() < f64::EPSILON {
            return Ok(template);
        }
        if t <= 0.0 {
            return Err(CoreError::invalid_rate(format!(
                "non-positive time {t} with compound factor {compound}"
            )));
        }
        let r = match template.regime(t) {
            Compounding::Simple => (compound - 1.0) / t,
            Compounding::Continuous => compound.ln() / t,
            _ => {
                let f = template.f();
                (compound.powf(1.0 / (f * t)) - 1.0) * f
            }
        };
        Ok(template.with_rate(r))
    }

    /// Equivalent rate under other conventions over `t` years.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`InterestRate::implied_rate`].
    pub fn equivalent_rate(
        &self,
        t: f64,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> CoreResult<Self> {
        Self::implied_rate(self.compound_factor(t), t, day_count, compounding, frequency)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}% {} {}",
            self.rate * 100.0,
            self.day_count.name(),
            self.compounding
        )?;
        if self.compounding.requires_frequency() {
            write!(f, " {}", self.frequency)?;
        }
        Ok(())
    }
}
