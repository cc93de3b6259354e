//! Short-rate models that build calibrated trees.

mod hull_white;

pub use hull_white::HullWhite;

use super::BinomialTree;

/// A short-rate model that can build a tree fitted to a discount function.
pub trait ShortRateModel {
    /// Builds a `steps`-step tree over `maturity` years whose zero-coupon
    /// prices match `discount(t)` at every step time.
    fn build_tree(&self, discount: &dyn Fn(f64) -> f64, maturity: f64, steps: usize)
        -> BinomialTree;
}
