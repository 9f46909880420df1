//! Hessian curvature estimation.
//!
//! Converts one TL/AD propagation pair into the scalar curvature
//! estimate `delta(k)` that becomes the next diagonal entry of the
//! tridiagonal system. The trial increment was `tau * q(k)`, so the
//! finite difference of gradients against the initial gradient, divided
//! by `tau`, is the Hessian applied to `q(k)`:
//!
//! ```text
//!   g_upd = (1/tau) * (ad_new + tl_old - gnorm * ad_old)
//!   delta(k) = <g_upd, q(k)>
//! ```
//!
//! where `ad_new` is the adjoint-evaluated observation gradient at the
//! trial increment, `tl_old` the background gradient there, and
//! `gnorm * ad_old` restores the unnormalized initial gradient.

use crate::grid::{LandMask, StaggeredGrid};
use crate::store::StateStore;
use crate::types::RecordIndex;

use super::error::MinimizerError;
use super::state::MinimizerState;
use super::workspace::Workspace;

/// Update `ws.ad_new` into the Hessian-applied gradient and return the
/// curvature estimate `delta(iter)`.
///
/// Reads the current gradient record `iter` into `ws.tl_work` and leaves
/// it there for the Lanczos recurrence that follows. A non-positive
/// estimate aborts the minimization; nothing has been written to the
/// store at that point, so the record sequence stays intact.
pub(crate) fn estimate_curvature(
    ws: &mut Workspace,
    grid: &StaggeredGrid,
    mask: &LandMask,
    store: &mut dyn StateStore,
    state: &mut MinimizerState,
    iter: usize,
) -> Result<f64, MinimizerError> {
    debug_assert!(iter >= 1, "no curvature estimate exists at iteration 0");

    ws.ad_new.add_scaled(&ws.tl_old, 1.0, mask);
    ws.ad_new.add_scaled(&ws.ad_old, -state.gnorm, mask);
    ws.ad_new.scale(1.0 / state.tau, mask);

    store.read(RecordIndex::new(iter), &mut ws.tl_work)?;
    let delta = ws.ad_new.dot(&ws.tl_work, grid, mask);

    if delta <= 0.0 {
        return Err(MinimizerError::IndefiniteHessian {
            iteration: iter,
            delta,
        });
    }
    state.delta[iter] = delta;
    Ok(delta)
}
