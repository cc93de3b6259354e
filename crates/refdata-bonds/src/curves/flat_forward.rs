//! Flat forward curve over a shared rate quote.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::{Compounding, Date, Frequency, InterestRate};

use super::DiscountCurve;
use crate::error::{BondError, BondResult};

/// A mutable rate shared between an engine and its curve.
///
/// Clones share the same value: setting it through one handle is seen by
/// every curve built on it.
#[derive(Clone)]
pub struct RateQuote {
    value: Arc<RwLock<f64>>,
}

impl RateQuote {
    /// Creates a quote.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> f64 {
        *self.value.read()
    }

    /// Replaces the value in place.
    pub fn set_value(&self, value: f64) {
        *self.value.write() = value;
    }
}

impl fmt::Debug for RateQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RateQuote").field(&self.value()).finish()
    }
}

/// A curve with the same zero rate at every tenor.
///
/// Discount factors follow the quote's compounding rule, e.g. for annual
/// compounding: `DF(t) = (1 + r)^-t` with `t` measured in the curve's day count.
#[derive(Debug, Clone)]
pub struct FlatForwardCurve {
    reference_date: Date,
    quote: RateQuote,
    conventions: InterestRate,
}

impl FlatForwardCurve {
    /// Creates a curve reading its rate from `quote`.
    ///
    /// # Errors
    ///
    /// Returns an error if the compounding rule needs a periodic frequency
    /// and `frequency` is not periodic.
    pub fn new(
        reference_date: Date,
        quote: RateQuote,
        day_count: DayCountConvention,
        compounding: Compounding,
        frequency: Frequency,
    ) -> BondResult<Self> {
        let conventions = InterestRate::new(quote.value(), day_count, compounding, frequency)?;
        Ok(Self {
            reference_date,
            quote,
            conventions,
        })
    }

    /// The shared quote.
    #[must_use]
    pub fn quote(&self) -> &RateQuote {
        &self.quote
    }

    /// Current curve rate with its conventions.
    #[must_use]
    pub fn rate(&self) -> InterestRate {
        self.conventions.with_rate(self.quote.value())
    }

    /// Sets the curve rate.
    ///
    /// # Errors
    ///
    /// Rejects negative or non-finite rates and leaves the quote unchanged.
    pub fn set_rate(&self, rate: f64) -> BondResult<()> {
        if !rate.is_finite() {
            return Err(BondError::invalid_rate(format!("rate {rate} is not finite")));
        }
        if rate < 0.0 {
            return Err(BondError::invalid_rate(format!(
                "curve rate must be non-negative, got {rate}"
            )));
        }
        self.quote.set_value(rate);
        Ok(())
    }

    /// Same quote and conventions anchored at another date.
    #[must_use]
    pub fn rebased(&self, reference_date: Date) -> Self {
        Self {
            reference_date,
            ..self.clone()
        }
    }
}

impl DiscountCurve for FlatForwardCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_count(&self) -> DayCountConvention {
        self.conventions.day_count()
    }

    fn discount_factor(&self, t: f64) -> f64 {
        self.rate().discount_factor(t)
    }
}
