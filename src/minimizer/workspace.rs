//! Solver workspace slots.

use crate::grid::StaggeredGrid;
use crate::state::{StateCapabilities, StateVector};

/// The resident state-vector slots of one minimization.
///
/// Allocated once at fixed extents and relabeled/overwritten in place
/// across iterations; everything else lives in the record store. Slots
/// must never be read and written by two components without an
/// intervening step boundary.
pub struct Workspace {
    /// The first normalized gradient `q(1)`, resident for the whole run.
    /// Borrowed as a scratch accumulator by the reduction-norm and
    /// eigenvector steps; the driver restores it from record 1.
    pub ad_old: StateVector,
    /// The incoming raw gradient, updated in place into the new
    /// orthonormal Lanczos vector each iteration.
    pub ad_new: StateVector,
    /// Background-term gradient at the current trial increment.
    pub tl_old: StateVector,
    /// Next tangent-linear initial condition (the driver's output).
    pub tl_new: StateVector,
    /// Record-read scratch for the Gram-Schmidt and reduction passes.
    pub tl_work: StateVector,
    /// Current descent direction.
    pub descent: StateVector,
}

impl Workspace {
    /// Allocate all slots zeroed at the extents of the run.
    pub fn allocate(grid: &StaggeredGrid, caps: &StateCapabilities) -> Self {
        Self {
            ad_old: StateVector::allocate(grid, caps),
            ad_new: StateVector::allocate(grid, caps),
            tl_old: StateVector::allocate(grid, caps),
            tl_new: StateVector::allocate(grid, caps),
            tl_work: StateVector::allocate(grid, caps),
            descent: StateVector::allocate(grid, caps),
        }
    }
}
