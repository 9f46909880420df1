//! # is4dvar
//!
//! Incremental strong-constraint 4D-Var minimization engine for
//! terrain-following ocean models.
//!
//! This crate provides the inner-loop machinery of a 4D-Var cycle:
//! - Capability-driven model state vectors with masked, metric-weighted
//!   arithmetic
//! - A persisted gradient-record store (in-memory, or NetCDF behind the
//!   `netcdf` feature)
//! - The conjugate-gradient/Lanczos minimizer: curvature estimation,
//!   basis extension with full re-orthogonalization, tridiagonal solve,
//!   Ritz eigenpair analysis and Hessian eigenvector output
//! - Propagator traits for the tangent-linear and adjoint models, with a
//!   canonical self-adjoint biharmonic tracer-mixing operator
//!
//! The physical stencil kernels, grid generation and observation
//! handling live in the surrounding model; this crate consumes them
//! through the `propagator` and `grid` seams.

pub mod grid;
pub mod minimizer;
pub mod propagator;
pub mod reduction;
pub mod state;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use grid::{LandMask, LandMaskStatistics, StaggeredGrid};
pub use minimizer::{
    solve_symmetric_tridiagonal, ConvergedEigenpair, EigenError, FaerEigensolver, Minimizer,
    MinimizerConfig, MinimizerError, MinimizerState, RitzAnalysis, RunSummary, StepReport,
    TridiagonalEigen, TridiagonalEigensolver, Workspace,
};
pub use propagator::{
    AdjointModel, CostModel, PropagationError, TangentLinearModel, TlAdCostModel, TracerMix4,
};
pub use state::{Field, FieldKind, FieldShape, MomentumKind, StateCapabilities, StateVector};
pub use store::{MemoryStore, RitzPair, StateStore, StoreError};
#[cfg(feature = "netcdf")]
pub use store::{FileLayout, NetcdfStore, NetcdfStoreConfig};
pub use types::{RecordIndex, TracerIndex};
