//! Lanczos basis extension.
//!
//! Grows the orthonormal gradient basis by one vector per inner
//! iteration:
//!
//! 1. recurrence — subtract `delta(k) * q(k)` and, past the second
//!    iteration, `beta(k) * q(k-1)` (re-read from the store; only O(1)
//!    vectors stay resident);
//! 2. full classical Gram-Schmidt against all previous records, in
//!    reverse order — the order matches how the coupling coefficients
//!    were derived and is load-bearing;
//! 3. normalization — the norm becomes `gnorm` at iteration 0 and
//!    `beta(k+1)` afterwards;
//! 4. projection bookkeeping — `qg(k+1) = gnorm * <q(k+1), q(1)>`, the
//!    right-hand-side entry of the tridiagonal system.
//!
//! The new vector is persisted as record `k+1`; this module is the only
//! writer of gradient records.

use crate::grid::{LandMask, StaggeredGrid};
use crate::store::StateStore;
use crate::types::RecordIndex;

use super::error::MinimizerError;
use super::state::MinimizerState;
use super::workspace::Workspace;

/// Extend the basis with the gradient currently in `ws.ad_new`.
///
/// On entry at `iter > 0`, `ws.tl_work` must still hold record `iter`
/// (left there by the curvature estimate). On return `ws.ad_new` holds
/// the new orthonormal vector `q(iter + 1)`, which has also been written
/// to the store.
///
/// When `check_orthogonality` is set, all prior records are re-read
/// after orthogonalization and the residual dot products are returned;
/// they should be at round-off level.
pub(crate) fn extend_basis(
    ws: &mut Workspace,
    grid: &StaggeredGrid,
    mask: &LandMask,
    store: &mut dyn StateStore,
    state: &mut MinimizerState,
    iter: usize,
    check_orthogonality: bool,
) -> Result<Option<Vec<f64>>, MinimizerError> {
    // Recurrence: the previous orthonormal vector is still resident.
    if iter > 0 {
        ws.ad_new.add_scaled(&ws.tl_work, -state.delta[iter], mask);
    }
    if iter > 1 {
        store.read(RecordIndex::new(iter - 1), &mut ws.tl_work)?;
        ws.ad_new.add_scaled(&ws.tl_work, -state.beta[iter], mask);
    }

    // Full re-orthogonalization, reverse order. Overwriting ad_new in
    // place is safe: the records read back are orthogonal to each other.
    for rec in RecordIndex::descending(iter) {
        store.read(rec, &mut ws.tl_work)?;
        let dot = ws.ad_new.dot(&ws.tl_work, grid, mask);
        ws.ad_new.add_scaled(&ws.tl_work, -dot, mask);
    }

    // Normalize.
    let norm = ws.ad_new.norm(grid, mask);
    if iter == 0 {
        state.gnorm = norm;
    } else {
        state.beta[iter + 1] = norm;
    }
    ws.ad_new.scale(1.0 / norm, mask);

    // Projection on the initial normalized gradient. The factor gnorm
    // undoes the normalization of q(1).
    let proj = if iter == 0 {
        ws.ad_new.dot(&ws.ad_new, grid, mask)
    } else {
        ws.ad_new.dot(&ws.ad_old, grid, mask)
    };
    state.qg[iter + 1] = state.gnorm * proj;

    store.write(RecordIndex::new(iter + 1), &ws.ad_new)?;

    if check_orthogonality {
        let mut residuals = Vec::with_capacity(iter);
        for rec in RecordIndex::descending(iter) {
            store.read(rec, &mut ws.tl_work)?;
            residuals.push(ws.ad_new.dot(&ws.tl_work, grid, mask));
        }
        return Ok(Some(residuals));
    }
    Ok(None)
}
