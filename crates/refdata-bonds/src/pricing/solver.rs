//! Root finding for yield solving.
//!
//! - [`newton_raphson`]: quadratic convergence when the derivative is known
//! - [`brent`]: bracketing method, guaranteed once a sign change is found
//! - [`solve_with_fallback`]: Newton first, then Brent over widening brackets

use crate::error::{BondError, BondResult};

/// Default tolerance for root finding.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default maximum iterations for root finding.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Configuration for root-finding algorithms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Tolerance for convergence.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

/// Result of a root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The root found.
    pub root: f64,
    /// Iterations used.
    pub iterations: u32,
    /// Function value at the root.
    pub residual: f64,
}

/// Newton-Raphson iteration `x_{n+1} = x_n - f(x_n) / f'(x_n)`.
///
/// # Errors
///
/// Fails on a vanishing or non-finite derivative, a non-finite iterate, or
/// when `max_iterations` is exhausted.
pub fn newton_raphson<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> BondResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    let mut x = initial_guess;

    for iteration in 0..config.max_iterations {
        let fx = f(x);
        if !fx.is_finite() {
            return Err(BondError::solver_failure(
                iteration,
                format!("objective is not finite at {x}"),
            ));
        }
        if fx.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration,
                residual: fx,
            });
        }

        let dfx = df(x);
        if !dfx.is_finite() || dfx.abs() < 1e-15 {
            return Err(BondError::solver_failure(
                iteration,
                format!("derivative {dfx} unusable at {x}"),
            ));
        }

        let step = fx / dfx;
        x -= step;

        if step.abs() < config.tolerance {
            return Ok(SolverResult {
                root: x,
                iterations: iteration + 1,
                residual: f(x),
            });
        }
    }

    Err(BondError::solver_failure(
        config.max_iterations,
        "Newton-Raphson did not converge",
    ))
}

/// Brent's method on the bracket `[a, b]`.
///
/// # Errors
///
/// Fails when `f(a)` and `f(b)` do not bracket a root or the iteration
/// budget runs out.
#[allow(clippy::many_single_char_names)]
pub fn brent<F>(f: F, a: f64, b: f64, config: &SolverConfig) -> BondResult<SolverResult>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (a, b);
    let (mut fa, mut fb) = (f(a), f(b));

    if !fa.is_finite() || !fb.is_finite() || fa * fb > 0.0 {
        return Err(BondError::solver_failure(
            0,
            format!("[{a}, {b}] does not bracket a root (f = {fa}, {fb})"),
        ));
    }
    if fa == 0.0 {
        return Ok(SolverResult {
            root: a,
            iterations: 0,
            residual: 0.0,
        });
    }

    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;

    for iteration in 0..config.max_iterations {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.tolerance;
        let m = 0.5 * (c - b);
        if m.abs() <= tol || fb == 0.0 || fb.abs() < config.tolerance {
            return Ok(SolverResult {
                root: b,
                iterations: iteration,
                residual: fb,
            });
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Inverse quadratic interpolation, secant when only two points differ
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(BondError::solver_failure(
                iteration,
                format!("objective is not finite at {b}"),
            ));
        }
    }

    Err(BondError::solver_failure(
        config.max_iterations,
        "Brent did not converge",
    ))
}

/// Newton from `initial_guess`, then Brent over widening brackets.
///
/// # Errors
///
/// Fails when neither method finds a root.
pub fn solve_with_fallback<F, DF>(
    f: F,
    df: DF,
    initial_guess: f64,
    config: &SolverConfig,
) -> BondResult<SolverResult>
where
    F: Fn(f64) -> f64,
    DF: Fn(f64) -> f64,
{
    if let Ok(result) = newton_raphson(&f, &df, initial_guess, config) {
        if result.root.is_finite() {
            return Ok(result);
        }
    }

    let brackets = [
        (initial_guess - 0.1, initial_guess + 0.1),
        (-0.1, 0.5),
        (-0.2, 1.0),
        (-0.5, 2.0),
    ];
    for (a, b) in brackets {
        if let Ok(result) = brent(&f, a, b, config) {
            return Ok(result);
        }
    }

    Err(BondError::solver_failure(
        config.max_iterations,
        "no root found by Newton or in any Brent bracket",
    ))
}
