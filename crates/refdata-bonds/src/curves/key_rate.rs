//! Key-rate bumping.
//!
//! A key-rate bump shifts zero rates by a triangular profile centred on one
//! tenor, falling to zero at the neighbouring key tenors. The first and last
//! key tenors extend flat to the ends of the curve, so the bumps of a full
//! profile add up to a parallel shift.

use refdata_core::daycounts::DayCountConvention;
use refdata_core::types::Date;

use super::DiscountCurve;

/// Key tenors (years) used when none are configured.
pub const DEFAULT_KEY_TENORS: &[f64] = &[0.5, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0];

/// Triangular shift centred on one key tenor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRateBump {
    key_tenor: f64,
    shift: f64,
    left_tenor: Option<f64>,
    right_tenor: Option<f64>,
}

impl KeyRateBump {
    /// Creates a bump with explicit neighbours.
    #[must_use]
    pub fn with_neighbors(
        key_tenor: f64,
        shift: f64,
        left_tenor: Option<f64>,
        right_tenor: Option<f64>,
    ) -> Self {
        Self {
            key_tenor,
            shift,
            left_tenor,
            right_tenor,
        }
    }

    /// One bump per tenor; `tenors` must be sorted ascending.
    #[must_use]
    pub fn profile(tenors: &[f64], shift: f64) -> Vec<Self> {
        tenors
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let left = if i > 0 { Some(tenors[i - 1]) } else { None };
                let right = tenors.get(i + 1).copied();
                Self::with_neighbors(t, shift, left, right)
            })
            .collect()
    }

    /// Centre tenor.
    #[must_use]
    pub fn key_tenor(&self) -> f64 {
        self.key_tenor
    }

    /// Shift applied at the centre, as a decimal rate.
    #[must_use]
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Same profile with a different shift.
    #[must_use]
    pub fn with_shift(&self, shift: f64) -> Self {
        Self { shift, ..*self }
    }

    /// Profile weight at time `t`.
    #[must_use]
    pub fn weight_at(&self, t: f64) -> f64 {
        if (t - self.key_tenor).abs() < 1e-10 {
            return 1.0;
        }
        if t < self.key_tenor {
            match self.left_tenor {
                Some(left) if t >= left => (t - left) / (self.key_tenor - left),
                Some(_) => 0.0,
                None => 1.0,
            }
        } else {
            match self.right_tenor {
                Some(right) if t <= right => (right - t) / (right - self.key_tenor),
                Some(_) => 0.0,
                None => 1.0,
            }
        }
    }

    /// Applies the bump to a curve.
    #[must_use]
    pub fn apply<'a, C: DiscountCurve + ?Sized>(&self, curve: &'a C) -> KeyRateBumpedCurve<'a, C> {
        KeyRateBumpedCurve {
            base: curve,
            bump: *self,
        }
    }
}

/// A curve with a key-rate bump applied: `DF'(t) = DF(t) * exp(-w(t) * shift * t)`.
#[derive(Debug)]
pub struct KeyRateBumpedCurve<'a, C: DiscountCurve + ?Sized> {
    base: &'a C,
    bump: KeyRateBump,
}

impl<C: DiscountCurve + ?Sized> KeyRateBumpedCurve<'_, C> {
    /// The applied bump.
    #[must_use]
    pub fn bump(&self) -> &KeyRateBump {
        &self.bump
    }
}

impl<C: DiscountCurve + ?Sized> DiscountCurve for KeyRateBumpedCurve<'_, C> {
    fn reference_date(&self) -> Date {
        self.base.reference_date()
    }

    fn day_count(&self) -> DayCountConvention {
        self.base.day_count()
    }

    fn discount_factor(&self, t: f64) -> f64 {
        let shift = self.bump.weight_at(t) * self.bump.shift;
        self.base.discount_factor(t) * (-shift * t).exp()
    }
}
