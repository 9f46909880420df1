//! The conjugate-gradient/Lanczos minimizer.
//!
//! Minimizes the quadratic 4D-Var cost function with the conjugate
//! gradient algorithm of Fisher (1997), exploiting its connection with
//! the Lanczos recurrence
//!
//! ```text
//!   H q(k+1) = Gamma(k+1) q(k+2) + Delta(k+1) q(k+1) + Gamma(k) q(k)
//! ```
//!
//! in which the orthonormalized gradients `q(k)` double as Lanczos
//! vectors of the Hessian. The projections onto the Krylov basis form a
//! symmetric tridiagonal system whose solution gives both the gradient
//! norm reduction achieved so far and, on the final inner iteration, the
//! minimizer increment; its eigenpairs approximate Hessian eigenpairs
//! and are persisted for preconditioning the next outer loop.
//!
//! Reference: Fisher, M., 1997: Efficient Minimization of Quadratic
//! Penalty Functions, unpublished manuscript, 1-14.

mod config;
mod driver;
mod error;
mod hessian;
mod lanczos;
mod ritz;
mod state;
mod tridiagonal;
mod workspace;

pub use config::MinimizerConfig;
pub use driver::{Minimizer, RunSummary, StepReport};
pub use error::{EigenError, MinimizerError};
pub use ritz::{
    ConvergedEigenpair, FaerEigensolver, RitzAnalysis, TridiagonalEigen, TridiagonalEigensolver,
};
pub use state::MinimizerState;
pub use tridiagonal::solve_symmetric_tridiagonal;
pub use workspace::Workspace;
