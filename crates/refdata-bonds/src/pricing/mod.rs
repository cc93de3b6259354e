//! Yield solving.

pub mod solver;
mod yield_solver;

pub use solver::{SolverConfig, SolverResult};
pub use yield_solver::{
    price_at_yield, price_derivative, price_second_derivative, TimedCashFlow, YieldSolver,
};
