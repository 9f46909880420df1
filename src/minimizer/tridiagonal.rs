//! Tridiagonal solve and gradient-norm reduction.
//!
//! Pure numerical linear algebra plus one store-walking reconstruction:
//!
//! - [`solve_symmetric_tridiagonal`] solves `T(k) z = -qg` by Thomas'
//!   algorithm (forward elimination, back substitution);
//! - [`gradient_reduction`] reconstructs the norm of the implied new
//!   gradient from the solution and reports `preduc = ||g_new|| / gnorm`,
//!   the convergence diagnostic consumed by the outer loop.

use crate::grid::{LandMask, StaggeredGrid};
use crate::store::StateStore;
use crate::types::RecordIndex;

use super::error::MinimizerError;
use super::state::MinimizerState;
use super::workspace::Workspace;

/// Solve `T z = -qg` for a symmetric tridiagonal `T` with diagonal
/// `delta` and off-diagonal `beta` (coupling rows `i` and `i + 1`).
///
/// All slices are 0-based here; `delta.len() == qg.len()` and
/// `beta.len() == delta.len() - 1`.
pub fn solve_symmetric_tridiagonal(delta: &[f64], beta: &[f64], qg: &[f64]) -> Vec<f64> {
    let k = delta.len();
    assert_eq!(qg.len(), k, "right-hand side length mismatch");
    assert_eq!(beta.len(), k.saturating_sub(1), "off-diagonal length mismatch");

    let mut z = vec![0.0; k];
    let mut gam = vec![0.0; k];

    // Decomposition and forward substitution.
    let mut bet = delta[0];
    z[0] = -qg[0] / bet;
    for i in 1..k {
        gam[i] = beta[i - 1] / bet;
        bet = delta[i] - beta[i - 1] * gam[i];
        z[i] = (-qg[i] - beta[i - 1] * z[i - 1]) / bet;
    }

    // Back substitution.
    for i in (0..k - 1).rev() {
        z[i] -= gam[i + 1] * z[i + 1];
    }
    z
}

/// Solve the current `iter x iter` system into `state.work[1..=iter]`.
pub(crate) fn solve_into_state(state: &mut MinimizerState, iter: usize) {
    let z = solve_symmetric_tridiagonal(
        &state.delta[1..=iter],
        &state.beta[2..=iter],
        &state.qg[1..=iter],
    );
    state.work[1..=iter].copy_from_slice(&z);
}

/// Reconstruct the gradient-norm reduction `preduc = ||g_new|| / gnorm`.
///
/// Borrows `ws.ad_old` as the accumulator: seeds it with
/// `gnorm * q(1) + beta(iter+1) * z(iter) * q(iter+1)`, subtracts
/// `(z(rec) + qg(rec)) * q(rec)` for every prior record, and takes the
/// norm. The caller restores `ws.ad_old` from record 1 afterwards.
pub(crate) fn gradient_reduction(
    ws: &mut Workspace,
    grid: &StaggeredGrid,
    mask: &LandMask,
    store: &mut dyn StateStore,
    state: &MinimizerState,
    iter: usize,
) -> Result<f64, MinimizerError> {
    // The qg terms carry the observation-term contribution and the z
    // terms the background-term contribution to the new gradient.
    let fac2 = state.beta[iter + 1] * state.work[iter];
    ws.ad_old.linear_combine(state.gnorm, &ws.ad_new, fac2, mask);

    for rec in RecordIndex::ascending(iter) {
        store.read(rec, &mut ws.tl_work)?;
        let fac = -(state.work[rec.get()] + state.qg[rec.get()]);
        ws.ad_old.add_scaled(&ws.tl_work, fac, mask);
    }

    Ok(ws.ad_old.norm(grid, mask) / state.gnorm)
}
