//! Yield-based risk measures.
//!
//! All measures take the bond's future cash flows positioned in time from
//! settlement and a yield with its conventions.
//!
//! | Measure | Formula |
//! |---------|---------|
//! | Macaulay duration | `Σ t·PV / P` |
//! | Modified duration | `-(dP/dy) / P` |
//! | Simple duration | `Σ t·PV / P` under simple compounding |
//! | Convexity | `(d²P/dy²) / P` |

use refdata_core::types::{Compounding, InterestRate};

use crate::error::{BondError, BondResult};
use crate::pricing::{price_at_yield, price_derivative, price_second_derivative, TimedCashFlow};

fn positive_price(flows: &[TimedCashFlow], rate: &InterestRate) -> BondResult<f64> {
    if flows.is_empty() {
        return Err(BondError::pricing("no future cash flows"));
    }
    let price = price_at_yield(flows, rate);
    if !(price.is_finite() && price > 0.0) {
        return Err(BondError::pricing(format!(
            "price {price} at yield {} is not positive",
            rate.rate()
        )));
    }
    Ok(price)
}

/// Present-value weighted average time to payment.
pub fn macaulay_duration(flows: &[TimedCashFlow], rate: &InterestRate) -> BondResult<f64> {
    let price = positive_price(flows, rate)?;
    let weighted: f64 = flows
        .iter()
        .map(|cf| cf.time * cf.amount * rate.discount_factor(cf.time))
        .sum();
    Ok(weighted / price)
}

/// Relative price sensitivity to the yield.
pub fn modified_duration(flows: &[TimedCashFlow], rate: &InterestRate) -> BondResult<f64> {
    let price = positive_price(flows, rate)?;
    Ok(-price_derivative(flows, rate) / price)
}

/// Macaulay duration with the yield re-read as a simple rate.
pub fn simple_duration(flows: &[TimedCashFlow], rate: &InterestRate) -> BondResult<f64> {
    let simple = InterestRate::new(
        rate.rate(),
        rate.day_count(),
        Compounding::Simple,
        rate.frequency(),
    )?;
    macaulay_duration(flows, &simple)
}

/// Second-order relative price sensitivity to the yield.
pub fn convexity(flows: &[TimedCashFlow], rate: &InterestRate) -> BondResult<f64> {
    let price = positive_price(flows, rate)?;
    Ok(price_second_derivative(flows, rate) / price)
}

/// Central-difference price change per unit of yield:
/// `(P(y - bump) - P(y + bump)) / (2 · bump)`.
///
/// Positive when prices fall as yields rise.
pub fn dv01<F>(price_at: F, rate: &InterestRate, bump: f64) -> BondResult<f64>
where
    F: Fn(&InterestRate) -> BondResult<f64>,
{
    if !(bump.is_finite() && bump > 0.0) {
        return Err(BondError::invalid_parameters(
            "bump_size",
            format!("must be positive, got {bump}"),
        ));
    }
    let down = price_at(&rate.with_rate(rate.rate() - bump))?;
    let up = price_at(&rate.with_rate(rate.rate() + bump))?;
    Ok((down - up) / (2.0 * bump))
}
