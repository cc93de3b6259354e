//! Price/yield relationship over a set of future cash flows.
//!
//! A yield is an [`InterestRate`] in the bond's day count, compounding and
//! frequency. The dirty price at settlement is
//!
//! ```text
//! P(y) = Σ cf_i · DF_y(t_i)
//! ```
//!
//! with `t_i` the year fraction from settlement to the payment date.

use refdata_core::types::InterestRate;

use super::solver::{solve_with_fallback, SolverConfig};
use crate::error::{BondError, BondResult};

/// A cash flow positioned in time for yield calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedCashFlow {
    /// Years from settlement.
    pub time: f64,
    /// Amount paid.
    pub amount: f64,
}

impl TimedCashFlow {
    /// Creates a timed cash flow.
    #[must_use]
    pub fn new(time: f64, amount: f64) -> Self {
        Self { time, amount }
    }
}

/// Dirty price at yield `rate`.
#[must_use]
pub fn price_at_yield(flows: &[TimedCashFlow], rate: &InterestRate) -> f64 {
    flows
        .iter()
        .map(|cf| cf.amount * rate.discount_factor(cf.time))
        .sum()
}

/// First derivative of the dirty price with respect to the yield.
#[must_use]
pub fn price_derivative(flows: &[TimedCashFlow], rate: &InterestRate) -> f64 {
    flows
        .iter()
        .map(|cf| cf.amount * rate.discount_factor_derivative(cf.time))
        .sum()
}

/// Second derivative of the dirty price with respect to the yield.
#[must_use]
pub fn price_second_derivative(flows: &[TimedCashFlow], rate: &InterestRate) -> f64 {
    flows
        .iter()
        .map(|cf| cf.amount * rate.discount_factor_second_derivative(cf.time))
        .sum()
}

/// Yield solver: Newton on the analytic derivative with Brent fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldSolver {
    config: SolverConfig,
}

impl YieldSolver {
    /// Creates a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Solver configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Finds the yield that prices `flows` at `target_dirty`.
    ///
    /// `conventions` supplies day count, compounding and frequency; its rate
    /// value is ignored.
    ///
    /// # Errors
    ///
    /// Fails for an empty flow set, a non-positive target, or when no root
    /// is found.
    pub fn solve(
        &self,
        flows: &[TimedCashFlow],
        target_dirty: f64,
        conventions: &InterestRate,
    ) -> BondResult<InterestRate> {
        if flows.is_empty() {
            return Err(BondError::pricing("no future cash flows to solve a yield on"));
        }
        if !(target_dirty.is_finite() && target_dirty > 0.0) {
            return Err(BondError::pricing(format!(
                "target price {target_dirty} must be positive"
            )));
        }

        let guess = initial_guess(flows, target_dirty);
        let objective = |y: f64| price_at_yield(flows, &conventions.with_rate(y)) - target_dirty;
        let derivative = |y: f64| price_derivative(flows, &conventions.with_rate(y));

        let result = solve_with_fallback(objective, derivative, guess, &self.config)?;
        log::debug!(
            "yield solved: {:.8} after {} iterations (residual {:.2e})",
            result.root,
            result.iterations,
            result.residual
        );
        Ok(conventions.with_rate(result.root))
    }
}

/// Current-yield style starting point: annualised gain over price.
fn initial_guess(flows: &[TimedCashFlow], target: f64) -> f64 {
    let total: f64 = flows.iter().map(|cf| cf.amount).sum();
    let horizon = flows.iter().map(|cf| cf.time).fold(0.0_f64, f64::max);
    if horizon <= 0.0 {
        return 0.05;
    }
    ((total / target - 1.0) / horizon).clamp(-0.05, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use refdata_core::daycounts::DayCountConvention;
    use refdata_core::types::{Compounding, Frequency};

    fn annual() -> InterestRate {
        InterestRate::new(
            0.0,
            DayCountConvention::Act365Fixed,
            Compounding::Compounded,
            Frequency::Annual,
        )
        .unwrap()
    }

    fn five_year_bond() -> Vec<TimedCashFlow> {
        let mut flows: Vec<TimedCashFlow> =
            (1..=5).map(|t| TimedCashFlow::new(f64::from(t), 5.0)).collect();
        flows[4].amount += 100.0;
        flows
    }

    #[test]
    fn test_par_bond_yields_coupon() {
        let y = YieldSolver::default().solve(&five_year_bond(), 100.0, &annual()).unwrap();
        assert_relative_eq!(y.rate(), 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_discount_bond_yields_above_coupon() {
        let y = YieldSolver::default().solve(&five_year_bond(), 95.0, &annual()).unwrap();
        assert!(y.rate() > 0.05);
        assert_relative_eq!(price_at_yield(&five_year_bond(), &y), 95.0, epsilon = 1e-8);
    }

    #[test]
    fn test_zero_coupon_closed_form() {
        let flows = [TimedCashFlow::new(7.0, 100.0)];
        let y = YieldSolver::default().solve(&flows, 82.03, &annual()).unwrap();
        assert_relative_eq!(y.rate(), (100.0_f64 / 82.03).powf(1.0 / 7.0) - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        let flows = five_year_bond();
        let rate = annual().with_rate(0.04);
        let h = 1e-6;
        let numeric = (price_at_yield(&flows, &rate.with_rate(0.04 + h))
            - price_at_yield(&flows, &rate.with_rate(0.04 - h)))
            / (2.0 * h);
        assert_relative_eq!(price_derivative(&flows, &rate), numeric, epsilon = 1e-4);
    }

    #[test]
    fn test_empty_flows_fail() {
        assert!(YieldSolver::default().solve(&[], 100.0, &annual()).is_err());
    }
}
