//! Cross-iteration minimizer state.

/// Recurrence coefficients and running scalars carried across inner
/// iterations.
///
/// Scoped to one outer-loop invocation: the driver creates a fresh
/// instance per run and threads it through every step function, so no
/// minimizer state outlives the run or leaks between runs.
///
/// The coefficient arrays are indexed 1-based to match the recurrence
/// (`delta(k)`, `beta(k)`, `qg(k)` for inner iteration `k`); slot 0 is
/// unused.
#[derive(Clone, Debug)]
pub struct MinimizerState {
    /// Tridiagonal diagonal: curvature estimates `delta(1..=k)`.
    pub(crate) delta: Vec<f64>,
    /// Tridiagonal off-diagonal: Lanczos coupling `beta(2..=k+1)`.
    pub(crate) beta: Vec<f64>,
    /// Projections of the orthonormal gradients on the initial gradient,
    /// `qg(1..=k+1)`.
    pub(crate) qg: Vec<f64>,
    /// Tridiagonal solution `z(1..=k)` (reduction coefficients).
    pub(crate) work: Vec<f64>,
    /// Norm of the initial gradient, fixed at iteration 0.
    pub gnorm: f64,
    /// Trial step size for the current iteration.
    pub tau: f64,
    /// Number of converged Ritz eigenpairs at the last analysis.
    pub n_converged: usize,
    /// Leading converged Ritz value and its position, if any.
    pub leading_ritz: Option<(usize, f64)>,
}

impl MinimizerState {
    /// Allocate state for up to `n_inner` inner iterations.
    pub fn new(n_inner: usize) -> Self {
        let n = n_inner + 2;
        Self {
            delta: vec![0.0; n],
            beta: vec![0.0; n],
            qg: vec![0.0; n],
            work: vec![0.0; n],
            gnorm: 0.0,
            tau: 0.0,
            n_converged: 0,
            leading_ritz: None,
        }
    }

    /// Curvature estimate `delta(k)`.
    pub fn delta(&self, k: usize) -> f64 {
        self.delta[k]
    }

    /// Coupling coefficient `beta(k)`.
    pub fn beta(&self, k: usize) -> f64 {
        self.beta[k]
    }

    /// Initial-gradient projection `qg(k)`.
    pub fn qg(&self, k: usize) -> f64 {
        self.qg[k]
    }

    /// Reduction coefficients `z(1..=k)` from the last tridiagonal solve.
    pub fn solution(&self, k: usize) -> &[f64] {
        &self.work[1..=k]
    }
}
