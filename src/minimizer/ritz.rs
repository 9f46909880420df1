//! Ritz eigenpairs of the projected Hessian.
//!
//! The eigenvalues of the tridiagonal T(k) approximate Hessian
//! eigenvalues; the a-posteriori bound for each is the trailing Lanczos
//! coefficient times the last row of the eigenvector matrix. On the
//! final inner iteration the converged pairs are materialized as
//! full-dimension Hessian eigenvectors — the preconditioner input of the
//! next outer loop.
//!
//! The eigensolver itself is an injected dependency behind
//! [`TridiagonalEigensolver`]; [`FaerEigensolver`] is the provided
//! implementation.

use faer::{Mat, Side};

use crate::grid::{LandMask, StaggeredGrid};
use crate::store::{RitzPair, StateStore};
use crate::types::RecordIndex;

use super::error::{EigenError, MinimizerError};
use super::state::MinimizerState;
use super::workspace::Workspace;

/// Eigendecomposition of a real symmetric tridiagonal matrix.
#[derive(Clone, Debug)]
pub struct TridiagonalEigen {
    /// Eigenvalues in ascending order.
    pub values: Vec<f64>,
    /// Eigenvectors, `vectors[i]` paired with `values[i]`.
    pub vectors: Vec<Vec<f64>>,
}

/// Injected symmetric tridiagonal eigensolver.
pub trait TridiagonalEigensolver {
    /// Decompose the matrix with the given diagonal and off-diagonal.
    fn decompose(&self, diag: &[f64], offdiag: &[f64]) -> Result<TridiagonalEigen, EigenError>;
}

/// Eigensolver backed by `faer`'s self-adjoint eigendecomposition.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaerEigensolver;

impl TridiagonalEigensolver for FaerEigensolver {
    fn decompose(&self, diag: &[f64], offdiag: &[f64]) -> Result<TridiagonalEigen, EigenError> {
        let n = diag.len();
        assert_eq!(offdiag.len(), n.saturating_sub(1), "off-diagonal length mismatch");

        let t = Mat::from_fn(n, n, |i, j| {
            if i == j {
                diag[i]
            } else if i + 1 == j {
                offdiag[i]
            } else if j + 1 == i {
                offdiag[j]
            } else {
                0.0
            }
        });
        let evd = t
            .as_ref()
            .self_adjoint_eigen(Side::Upper)
            .map_err(|e| EigenError::NoConvergence(format!("{:?}", e)))?;
        let u = evd.U();
        let s = evd.S();

        let mut pairs: Vec<(f64, Vec<f64>)> = (0..n)
            .map(|j| (s[j], (0..n).map(|i| u[(i, j)]).collect()))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(TridiagonalEigen {
            values: pairs.iter().map(|p| p.0).collect(),
            vectors: pairs.into_iter().map(|p| p.1).collect(),
        })
    }
}

/// Result of analysing the Ritz spectrum at one inner iteration.
#[derive(Clone, Debug)]
pub struct RitzAnalysis {
    /// Ritz values in ascending order.
    pub values: Vec<f64>,
    /// Error bound per Ritz value: `|beta(k+1) * V(k, i)|`.
    pub bounds: Vec<f64>,
    /// Convergence threshold: `grad_err * ritz_max`.
    pub tolerance: f64,
    /// Convergence flag per Ritz value.
    pub converged: Vec<bool>,
    /// Number of converged pairs.
    pub n_converged: usize,
    /// Leading converged value and its position, if any.
    pub leading: Option<(usize, f64)>,
    /// Eigenvectors of the tridiagonal matrix.
    pub(crate) vectors: Vec<Vec<f64>>,
}

/// Compute and vet the Ritz spectrum of the current T(iter).
pub(crate) fn analyze_spectrum(
    state: &mut MinimizerState,
    iter: usize,
    grad_err: f64,
    solver: &dyn TridiagonalEigensolver,
) -> Result<RitzAnalysis, MinimizerError> {
    let eig = solver
        .decompose(&state.delta[1..=iter], &state.beta[2..=iter])
        .map_err(|source| MinimizerError::Eigensolver {
            iteration: iter,
            source,
        })?;

    for (index, &value) in eig.values.iter().enumerate() {
        if value < 0.0 {
            return Err(MinimizerError::NegativeRitzValue {
                iteration: iter,
                index,
                value,
            });
        }
    }

    let trailing_beta = state.beta[iter + 1];
    let bounds: Vec<f64> = eig
        .vectors
        .iter()
        .map(|v| (trailing_beta * v[iter - 1]).abs())
        .collect();
    let tolerance = grad_err * eig.values[iter - 1];
    let converged: Vec<bool> = bounds.iter().map(|&b| b <= tolerance).collect();
    let n_converged = converged.iter().filter(|&&c| c).count();

    // Leading converged pair: largest converged Ritz value.
    let leading = (0..iter)
        .rev()
        .find(|&i| converged[i])
        .map(|i| (i, eig.values[i]));

    state.n_converged = n_converged;
    state.leading_ritz = leading;

    Ok(RitzAnalysis {
        values: eig.values,
        bounds,
        tolerance,
        converged,
        n_converged,
        leading,
        vectors: eig.vectors,
    })
}

/// A Hessian eigenvector persisted at the end of the run.
#[derive(Clone, Copy, Debug)]
pub struct ConvergedEigenpair {
    /// Output record holding the eigenvector.
    pub record: RecordIndex,
    /// Ritz value.
    pub value: f64,
    /// Eigenvalue-scaled error bound.
    pub error_bound: f64,
}

/// Materialize the converged Hessian eigenvectors into `evec_store`.
///
/// First pass (descending Ritz index): reconstruct each converged
/// eigenvector as `sum_rec V(rec, nvec) * q(rec)` through repeated
/// record reads, and persist the raw combination. Second pass
/// (ascending): orthonormalize each against the vectors already
/// finalized, normalize, and replace the record together with its Ritz
/// value and error bound.
///
/// Borrows `ws.ad_old` and `ws.tl_work` as scratch; the run is past its
/// last curvature estimate at this point.
pub(crate) fn materialize_eigenvectors(
    ws: &mut Workspace,
    grid: &StaggeredGrid,
    mask: &LandMask,
    store: &mut dyn StateStore,
    evec_store: &mut dyn StateStore,
    analysis: &RitzAnalysis,
    iter: usize,
    hevec_err: f64,
) -> Result<Vec<ConvergedEigenpair>, MinimizerError> {
    // Select on eigenvalue-scaled bounds.
    let scaled: Vec<f64> = analysis
        .bounds
        .iter()
        .zip(analysis.values.iter())
        .map(|(b, v)| b / v)
        .collect();

    let mut pairs = Vec::new();
    for nvec in (0..iter).rev() {
        if scaled[nvec] > hevec_err {
            continue;
        }
        let record = RecordIndex::new(pairs.len() + 1);

        ws.ad_old.fill(0.0, mask);
        for rec in RecordIndex::ascending(iter) {
            store.read(rec, &mut ws.tl_work)?;
            let weight = analysis.vectors[nvec][rec.get() - 1];
            ws.ad_old.add_scaled(&ws.tl_work, weight, mask);
        }
        evec_store.write(record, &ws.ad_old)?;

        pairs.push(ConvergedEigenpair {
            record,
            value: analysis.values[nvec],
            error_bound: scaled[nvec],
        });
    }

    // Orthonormalize against the already-finalized vectors and replace.
    for n in 1..=pairs.len() {
        evec_store.read(RecordIndex::new(n), &mut ws.ad_old)?;
        for r in 1..n {
            evec_store.read(RecordIndex::new(r), &mut ws.tl_work)?;
            let dot = ws.ad_old.dot(&ws.tl_work, grid, mask);
            ws.ad_old.add_scaled(&ws.tl_work, -dot, mask);
        }
        let norm = ws.ad_old.norm(grid, mask);
        ws.ad_old.scale(1.0 / norm, mask);

        let pair = &pairs[n - 1];
        evec_store.write_eigenpair(
            RecordIndex::new(n),
            &ws.ad_old,
            RitzPair {
                value: pair.value,
                error_bound: pair.error_bound,
            },
        )?;
    }

    Ok(pairs)
}
