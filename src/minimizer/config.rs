//! Minimizer configuration.

/// Configuration for one outer-loop invocation of the minimizer.
#[derive(Clone, Debug)]
pub struct MinimizerConfig {
    /// Number of inner (conjugate-gradient/Lanczos) iterations.
    pub n_inner: usize,
    /// Trial step size applied to each new descent direction.
    pub cg_step_init: f64,
    /// Relative tolerance for Ritz error bounds; an eigenpair is
    /// converged when its bound falls below `grad_err` times the largest
    /// Ritz value.
    pub grad_err: f64,
    /// Tolerance on the eigenvalue-scaled bounds used to select which
    /// converged eigenpairs are materialized as Hessian eigenvectors.
    pub hevec_err: f64,
    /// Whether to compute the Ritz spectrum each iteration (needed for
    /// preconditioning the next outer loop).
    pub compute_ritz: bool,
    /// Re-read all prior records after orthogonalization and report the
    /// residual dot products (orthogonality self-test).
    pub check_orthogonality: bool,
    /// Print per-iteration descent parameters to stdout.
    pub verbose: bool,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            n_inner: 10,
            cg_step_init: 1.0e-4,
            grad_err: 1.0e-4,
            hevec_err: 1.0e-2,
            compute_ritz: true,
            check_orthogonality: false,
            verbose: false,
        }
    }
}

impl MinimizerConfig {
    /// Create a configuration with the given number of inner iterations.
    pub fn new(n_inner: usize) -> Self {
        assert!(n_inner >= 1, "at least one inner iteration is required");
        Self {
            n_inner,
            ..Self::default()
        }
    }

    /// Set the trial step size.
    pub fn with_cg_step(mut self, step: f64) -> Self {
        self.cg_step_init = step;
        self
    }

    /// Set the Ritz convergence tolerance.
    pub fn with_grad_err(mut self, tol: f64) -> Self {
        self.grad_err = tol;
        self
    }

    /// Set the eigenvector materialization tolerance.
    pub fn with_hevec_err(mut self, tol: f64) -> Self {
        self.hevec_err = tol;
        self
    }

    /// Enable/disable the Ritz spectrum computation.
    pub fn with_ritz(mut self, enabled: bool) -> Self {
        self.compute_ritz = enabled;
        self
    }

    /// Enable/disable the orthogonality self-test.
    pub fn with_orthogonality_check(mut self, enabled: bool) -> Self {
        self.check_orthogonality = enabled;
        self
    }

    /// Enable/disable stdout progress reports.
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = MinimizerConfig::new(5)
            .with_cg_step(0.5)
            .with_orthogonality_check(true);
        assert_eq!(config.n_inner, 5);
        assert_eq!(config.cg_step_init, 0.5);
        assert!(config.check_orthogonality);
        assert!(config.compute_ritz);
    }

    #[test]
    #[should_panic(expected = "at least one inner iteration")]
    fn test_zero_inner_iterations_rejected() {
        let _ = MinimizerConfig::new(0);
    }
}
