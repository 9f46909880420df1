//! Minimizer error taxonomy.
//!
//! A failed numerical step invalidates the whole minimization: none of
//! these conditions are retried, and recovery means restarting the outer
//! procedure. Breakdown errors carry the offending inner iteration and
//! the diagnostic scalar so the failure is attributable from the message
//! alone.

use thiserror::Error;

use crate::propagator::PropagationError;
use crate::store::StoreError;

/// Errors surfaced by the conjugate-gradient/Lanczos minimizer.
#[derive(Debug, Error)]
pub enum MinimizerError {
    /// The curvature estimate came out non-positive: the Hessian is not
    /// positive definite along the current direction.
    #[error(
        "Hessian estimate not positive definite at inner iteration {iteration}: Delta = {delta:e}"
    )]
    IndefiniteHessian {
        /// Inner iteration at which the estimate was formed.
        iteration: usize,
        /// The offending curvature value.
        delta: f64,
    },

    /// A Ritz value of the projected Hessian is negative.
    #[error(
        "negative Ritz value {value:e} (position {index}) at inner iteration {iteration}"
    )]
    NegativeRitzValue {
        /// Inner iteration at which the spectrum was computed.
        iteration: usize,
        /// Position of the offending eigenvalue (ascending order).
        index: usize,
        /// The offending eigenvalue.
        value: f64,
    },

    /// The tridiagonal eigensolver failed.
    #[error("tridiagonal eigensolver failed at inner iteration {iteration}: {source}")]
    Eigensolver {
        /// Inner iteration at which the spectrum was requested.
        iteration: usize,
        /// Underlying eigensolver error.
        #[source]
        source: EigenError,
    },

    /// Record store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Model propagation failure.
    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

/// Errors from an injected symmetric tridiagonal eigensolver.
///
/// The backing library's error type is wrapped as text because
/// [`faer::linalg::evd::EvdError`] does not implement the standard
/// [`std::error::Error`] trait.
#[derive(Debug, Error, PartialEq)]
pub enum EigenError {
    /// The iteration did not converge.
    #[error("eigendecomposition did not converge: {0}")]
    NoConvergence(String),
}
