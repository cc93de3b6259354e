//! Hull-White one-factor short rate model.
//!
//! ```text
//! dr = (θ(t) - a*r)dt + σ*dW
//! ```
//!
//! - `a`: mean reversion speed
//! - `σ`: volatility
//! - `θ(t)`: drift, fitted to the initial discount curve

use super::{BinomialTree, ShortRateModel};

/// Hull-White one-factor short rate model.
///
/// The tree uses equal branch probabilities with a node spacing that shrinks
/// with the horizon so the variance of the short rate at time `t` is the
/// Hull-White value `σ²(1 - e^(-2at)) / 2a`. The level at each step is then
/// shifted so the tree reprices the discount curve exactly.
///
/// # Example
///
/// ```rust
/// use refdata_bonds::options::{HullWhite, ShortRateModel};
///
/// let model = HullWhite::new(0.03, 0.01);
/// let tree = model.build_tree(&|t: f64| (-0.04 * t).exp(), 5.0, 50);
/// assert_eq!(tree.steps, 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullWhite {
    mean_reversion: f64,
    volatility: f64,
}

impl HullWhite {
    /// Creates a model. Mean reversion is floored at 0.001.
    #[must_use]
    pub fn new(mean_reversion: f64, volatility: f64) -> Self {
        Self {
            mean_reversion: mean_reversion.max(0.001),
            volatility: volatility.abs(),
        }
    }

    /// Mean reversion speed.
    #[must_use]
    pub fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    /// Short rate volatility.
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Volatility that gives a random walk the Hull-White variance at `t`.
    #[must_use]
    pub fn effective_volatility(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        if t <= 0.0 {
            return self.volatility;
        }
        self.volatility * ((1.0 - (-2.0 * a * t).exp()) / (2.0 * a * t)).sqrt()
    }
}

impl ShortRateModel for HullWhite {
    fn build_tree(
        &self,
        discount: &dyn Fn(f64) -> f64,
        maturity: f64,
        steps: usize,
    ) -> BinomialTree {
        let steps = steps.max(1);
        let dt = maturity / steps as f64;
        let mut tree = BinomialTree::new(steps, dt);

        // Arrow-Debreu prices of the current step's states
        let mut state_prices = vec![1.0];

        for i in 0..steps {
            let spacing = self.effective_volatility(tree.time_at_step(i)) * dt.sqrt();
            let offsets: Vec<f64> = (0..=i)
                .map(|j| (2.0 * j as f64 - i as f64) * spacing)
                .collect();

            let target = discount(tree.time_at_step(i + 1));
            let unshifted: f64 = state_prices
                .iter()
                .zip(&offsets)
                .map(|(q, x)| q * (-x * dt).exp())
                .sum();
            let alpha = (unshifted / target).ln() / dt;

            let mut next = vec![0.0; i + 2];
            for j in 0..=i {
                let rate = alpha + offsets[j];
                tree.set_rate(i, j, rate);
                let carried = 0.5 * state_prices[j] * (-rate * dt).exp();
                next[j] += carried;
                next[j + 1] += carried;
            }
            state_prices = next;
        }

        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_reversion_floor() {
        let model = HullWhite::new(0.0, -0.01);
        assert_relative_eq!(model.mean_reversion(), 0.001);
        assert_relative_eq!(model.volatility(), 0.01);
    }

    #[test]
    fn test_effective_volatility_decays() {
        let model = HullWhite::new(0.1, 0.01);
        assert_relative_eq!(model.effective_volatility(0.0), 0.01);
        assert!(model.effective_volatility(10.0) < model.effective_volatility(1.0));
    }

    #[test]
    fn test_tree_reprices_discount_curve() {
        let discount = |t: f64| 1.04_f64.powf(-t);
        let tree = HullWhite::new(0.03, 0.015).build_tree(&discount, 5.0, 40);
        for k in [1usize, 10, 25, 40] {
            let mut flows = vec![0.0; k + 1];
            flows[k] = 1.0;
            let sub = BinomialTree {
                steps: k,
                dt: tree.dt,
                rates: tree.rates[..k].to_vec(),
            };
            let pv = sub.backward_induction(&flows, 0.0, |_, v| v);
            assert_relative_eq!(pv, discount(tree.time_at_step(k)), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rates_spread_with_volatility() {
        let discount = |t: f64| (-0.03 * t).exp();
        let tree = HullWhite::new(0.03, 0.01).build_tree(&discount, 2.0, 20);
        let last = &tree.rates[19];
        assert!(last[19] > last[0]);
        assert!(last.windows(2).all(|w| w[1] > w[0]));
    }
}
