//! Embedded option valuation for callable and putable bonds.
//!
//! - **Binomial Tree**: recombining short-rate lattice with backward induction
//! - **Hull-White**: tree construction fitted to the discount curve
//! - [`option_adjusted_dirty_price`]: values a bond's flows with call or put exercise

pub mod binomial_tree;
pub mod models;

pub use binomial_tree::BinomialTree;
pub use models::{HullWhite, ShortRateModel};

use crate::error::{BondError, BondResult};

/// Who holds the embedded option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseStyle {
    /// Issuer may redeem early; the holder receives the lower value.
    Call,
    /// Holder may sell back early; the holder receives the higher value.
    Put,
}

/// An exercise opportunity positioned in tree time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExercisePoint {
    /// Years from settlement.
    pub time: f64,
    /// Amount paid on exercise (clean price plus accrued), per 100 of face.
    pub strike: f64,
}

/// Dirty price per 100 of face of flows with embedded exercise.
///
/// `flows` are `(time, amount)` pairs measured from settlement, `discount`
/// returns settlement-relative discount factors. Flows and exercise times
/// are snapped to the nearest step; flow amounts are re-discounted from
/// their true time to the step time so that without volatility the result
/// equals plain curve discounting.
pub fn option_adjusted_dirty_price(
    model: &dyn ShortRateModel,
    discount: &dyn Fn(f64) -> f64,
    flows: &[(f64, f64)],
    exercise: &[ExercisePoint],
    style: ExerciseStyle,
    steps: usize,
) -> BondResult<f64> {
    let horizon = flows.iter().map(|(t, _)| *t).fold(0.0_f64, f64::max);
    if horizon <= 0.0 {
        return Err(BondError::pricing("no future cash flows for the tree"));
    }
    let steps = steps.max(1);
    let tree = model.build_tree(discount, horizon, steps);
    let step_of = |t: f64| ((t / tree.dt).round() as usize).clamp(1, steps);

    let mut step_flows = vec![0.0; steps + 1];
    for &(t, amount) in flows {
        let k = step_of(t);
        step_flows[k] += amount * discount(t) / discount(tree.time_at_step(k));
    }

    let mut strikes: Vec<Option<f64>> = vec![None; steps + 1];
    for point in exercise.iter().filter(|p| p.time > 0.0 && p.time < horizon) {
        let k = step_of(point.time);
        strikes[k] = Some(match (strikes[k], style) {
            (Some(existing), ExerciseStyle::Call) => existing.min(point.strike),
            (Some(existing), ExerciseStyle::Put) => existing.max(point.strike),
            (None, _) => point.strike,
        });
    }

    let price = tree.backward_induction(&step_flows, 0.0, |i, continuation| {
        match (strikes[i], style) {
            (Some(strike), ExerciseStyle::Call) => continuation.min(strike),
            (Some(strike), ExerciseStyle::Put) => continuation.max(strike),
            (None, _) => continuation,
        }
    });

    if price.is_finite() {
        Ok(price)
    } else {
        Err(BondError::pricing("tree valuation produced a non-finite price"))
    }
}
