//! Frequency and compounding types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::period::Period;

/// How often a rate compounds or a coupon pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    /// No periodic payments.
    NoFrequency,
    /// A single payment at maturity.
    Once,
    /// One payment per year.
    #[default]
    Annual,
    /// Two payments per year.
    Semiannual,
    /// Four payments per year.
    Quarterly,
    /// Twelve payments per year.
    Monthly,
    /// Fifty-two payments per year.
    Weekly,
    /// Daily payments (365 per year).
    Daily,
    /// Irregular schedule.
    OtherFrequency,
}

impl Frequency {
    /// Returns the number of periods per year, zero for non-periodic frequencies.
    #[must_use]
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::NoFrequency | Frequency::Once | Frequency::OtherFrequency => 0,
            Frequency::Annual => 1,
            Frequency::Semiannual => 2,
            Frequency::Quarterly => 4,
            Frequency::Monthly => 12,
            Frequency::Weekly => 52,
            Frequency::Daily => 365,
        }
    }

    /// Returns the number of months per period for month-based frequencies.
    #[must_use]
    pub fn months_per_period(&self) -> Option<u32> {
        match self {
            Frequency::Annual => Some(12),
            Frequency::Semiannual => Some(6),
            Frequency::Quarterly => Some(3),
            Frequency::Monthly => Some(1),
            _ => None,
        }
    }

    /// Returns the tenor of one period.
    #[must_use]
    pub fn tenor(&self) -> Period {
        match self {
            Frequency::NoFrequency => Period::days(0),
            Frequency::Once | Frequency::Annual => Period::years(1),
            Frequency::Semiannual => Period::months(6),
            Frequency::Quarterly => Period::months(3),
            Frequency::Monthly => Period::months(1),
            Frequency::Weekly => Period::weeks(1),
            Frequency::Daily | Frequency::OtherFrequency => Period::days(1),
        }
    }

    /// Returns true if a compounded rate can use this frequency.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.periods_per_year() > 0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::NoFrequency => "No-Frequency",
            Frequency::Once => "Once",
            Frequency::Annual => "Annual",
            Frequency::Semiannual => "Semiannual",
            Frequency::Quarterly => "Quarterly",
            Frequency::Monthly => "Monthly",
            Frequency::Weekly => "Weekly",
            Frequency::Daily => "Daily",
            Frequency::OtherFrequency => "Unknown frequency",
        };
        write!(f, "{name}")
    }
}

/// Interest compounding rule.
///
/// The mixed rules switch regime after the first compounding period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Compounding {
    /// `1 + r t`
    Simple,
    /// `(1 + r/f)^(f t)`
    #[default]
    Compounded,
    /// `exp(r t)`
    Continuous,
    /// Simple up to one period, compounded afterwards.
    SimpleThenCompounded,
    /// Compounded up to one period, simple afterwards.
    CompoundedThenSimple,
}

impl Compounding {
    /// Returns true if the rule needs a periodic frequency.
    #[must_use]
    pub fn requires_frequency(&self) -> bool {
        !matches!(self, Compounding::Simple | Compounding::Continuous)
    }
}

impl fmt::Display for Compounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compounding::Simple => "Simple",
            Compounding::Compounded => "Compounded",
            Compounding::Continuous => "Continuous",
            Compounding::SimpleThenCompounded => "SimpleThenCompounded",
            Compounding::CompoundedThenSimple => "CompoundedThenSimple",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_periods() {
        assert_eq!(Frequency::Annual.periods_per_year(), 1);
        assert_eq!(Frequency::Semiannual.periods_per_year(), 2);
        assert_eq!(Frequency::Weekly.periods_per_year(), 52);
        assert_eq!(Frequency::NoFrequency.periods_per_year(), 0);
        assert!(!Frequency::Once.is_periodic());
    }

    #[test]
    fn test_frequency_tenor() {
        assert_eq!(Frequency::NoFrequency.tenor(), Period::days(0));
        assert_eq!(Frequency::Once.tenor(), Period::years(1));
        assert_eq!(Frequency::Semiannual.tenor(), Period::months(6));
        assert_eq!(Frequency::OtherFrequency.tenor(), Period::days(1));
    }

    #[test]
    fn test_compounding_frequency_requirement() {
        assert!(Compounding::Compounded.requires_frequency());
        assert!(Compounding::SimpleThenCompounded.requires_frequency());
        assert!(!Compounding::Simple.requires_frequency());
        assert!(!Compounding::Continuous.requires_frequency());
    }
}
