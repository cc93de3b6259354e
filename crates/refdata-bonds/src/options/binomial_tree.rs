//! Recombining binomial short-rate tree.

/// A binomial interest rate tree with equal branch probabilities.
///
/// At step `i` there are `i + 1` states. State `j` has `j` up moves, and its
/// children are `(i + 1, j)` (down) and `(i + 1, j + 1)` (up).
///
/// ```text
///                    [0,0]
///                   /     \
///              [1,1]       [1,0]
///             /    \      /    \
///         [2,2]   [2,1]  [2,1]  [2,0]
/// ```
#[derive(Debug, Clone)]
pub struct BinomialTree {
    /// Number of time steps.
    pub steps: usize,

    /// Time step size in years.
    pub dt: f64,

    /// `rates[i][j]`: continuously compounded short rate from step `i` to `i + 1`.
    pub rates: Vec<Vec<f64>>,
}

impl BinomialTree {
    /// Creates a tree with all rates zero.
    #[must_use]
    pub fn new(steps: usize, dt: f64) -> Self {
        let rates = (0..steps).map(|i| vec![0.0; i + 1]).collect();
        Self { steps, dt, rates }
    }

    /// Short rate at a node.
    ///
    /// # Panics
    ///
    /// Panics if `time_step >= steps` or `state > time_step`.
    #[must_use]
    pub fn rate_at(&self, time_step: usize, state: usize) -> f64 {
        self.rates[time_step][state]
    }

    /// Sets the short rate at a node.
    ///
    /// # Panics
    ///
    /// Panics if `time_step >= steps` or `state > time_step`.
    pub fn set_rate(&mut self, time_step: usize, state: usize, rate: f64) {
        self.rates[time_step][state] = rate;
    }

    /// One-step discount factor `exp(-(r + spread) * dt)` from a node.
    #[must_use]
    pub fn discount_factor(&self, time_step: usize, state: usize, spread: f64) -> f64 {
        (-(self.rates[time_step][state] + spread) * self.dt).exp()
    }

    /// Number of states at a step.
    #[must_use]
    pub fn states_at(&self, time_step: usize) -> usize {
        time_step + 1
    }

    /// Time in years at a step.
    #[must_use]
    pub fn time_at_step(&self, time_step: usize) -> f64 {
        time_step as f64 * self.dt
    }

    /// Tree horizon in years.
    #[must_use]
    pub fn maturity(&self) -> f64 {
        self.steps as f64 * self.dt
    }

    /// Values a claim by backward induction.
    ///
    /// `step_flows[i]` is paid at step `i` in every state (length `steps + 1`).
    /// At each interior step `exercise(i, continuation)` returns the holder's
    /// value after any exercise decision, before that step's flow is added.
    #[must_use]
    pub fn backward_induction<E>(&self, step_flows: &[f64], spread: f64, exercise: E) -> f64
    where
        E: Fn(usize, f64) -> f64,
    {
        let n = self.steps;
        let flow_at = |i: usize| step_flows.get(i).copied().unwrap_or(0.0);

        let mut values = vec![flow_at(n); n + 1];

        for i in (0..n).rev() {
            let mut next = Vec::with_capacity(i + 1);
            for j in 0..=i {
                let continuation =
                    self.discount_factor(i, j, spread) * 0.5 * (values[j] + values[j + 1]);
                let held = if i > 0 { exercise(i, continuation) } else { continuation };
                next.push(held + flow_at(i));
            }
            values = next;
        }

        values[0]
    }
}
