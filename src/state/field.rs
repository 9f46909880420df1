//! Field identities and storage.
//!
//! A model state is a collection of named physical fields, each living on
//! its own staggered grid location. Which fields exist for a given run is
//! decided by the [`StateCapabilities`](super::StateCapabilities)
//! descriptor, not by the type system, so a single state-vector type
//! covers depth-averaged and fully 3D configurations with and without
//! surface forcing corrections.

use std::borrow::Cow;

use crate::grid::StaggeredGrid;
use crate::types::TracerIndex;

/// Staggered grid location of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staggering {
    /// Cell centers (free surface, tracers).
    Rho,
    /// x-edges (x-momentum, x wind stress).
    UPoint,
    /// y-edges (y-momentum, y wind stress).
    VPoint,
}

/// Identity of one physical field within a state vector.
///
/// The derived `Ord` fixes the canonical field order used by every
/// whole-state operation, which keeps reductions deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Free-surface elevation (rho, 2D).
    FreeSurface,
    /// Depth-averaged x-momentum (u, 2D). Barotropic runs only.
    UBar,
    /// Depth-averaged y-momentum (v, 2D). Barotropic runs only.
    VBar,
    /// x-momentum (u, 3D).
    U,
    /// y-momentum (v, 3D).
    V,
    /// Tracer (rho, 3D), indexed by tracer slot.
    Tracer(TracerIndex),
    /// Surface wind stress correction, x component (u, 2D).
    StressU,
    /// Surface wind stress correction, y component (v, 2D).
    StressV,
    /// Surface tracer flux correction (rho, 2D), indexed by tracer slot.
    TracerFlux(TracerIndex),
}

impl FieldKind {
    /// Staggered location of this field.
    pub fn staggering(&self) -> Staggering {
        match self {
            FieldKind::FreeSurface | FieldKind::Tracer(_) | FieldKind::TracerFlux(_) => {
                Staggering::Rho
            }
            FieldKind::UBar | FieldKind::U | FieldKind::StressU => Staggering::UPoint,
            FieldKind::VBar | FieldKind::V | FieldKind::StressV => Staggering::VPoint,
        }
    }

    /// Whether the field has a vertical extent.
    pub fn is_three_d(&self) -> bool {
        matches!(self, FieldKind::U | FieldKind::V | FieldKind::Tracer(_))
    }

    /// Variable name used by persisted records.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            FieldKind::FreeSurface => Cow::Borrowed("zeta"),
            FieldKind::UBar => Cow::Borrowed("ubar"),
            FieldKind::VBar => Cow::Borrowed("vbar"),
            FieldKind::U => Cow::Borrowed("u"),
            FieldKind::V => Cow::Borrowed("v"),
            FieldKind::StressU => Cow::Borrowed("sustr"),
            FieldKind::StressV => Cow::Borrowed("svstr"),
            FieldKind::Tracer(t) => Cow::Owned(format!("tracer_{:02}", t.get() + 1)),
            FieldKind::TracerFlux(t) => Cow::Owned(format!("stflx_{:02}", t.get() + 1)),
        }
    }

    /// Shape of this field on the given grid.
    pub fn shape(&self, grid: &StaggeredGrid) -> FieldShape {
        let (nx, ny) = match self.staggering() {
            Staggering::Rho => (grid.nx, grid.ny),
            Staggering::UPoint => (grid.nxu(), grid.ny),
            Staggering::VPoint => (grid.nx, grid.nyv()),
        };
        let nz = if self.is_three_d() { grid.nz } else { 1 };
        FieldShape { nx, ny, nz }
    }
}

/// Extents of one field array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldShape {
    /// Points in xi.
    pub nx: usize,
    /// Points in eta.
    pub ny: usize,
    /// Vertical levels (1 for 2D fields).
    pub nz: usize,
}

impl FieldShape {
    /// Total number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Whether the shape has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of point (i, j, k), k-major.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }
}

/// One field: a flat array over its staggered extents.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    /// Point values, k-major layout.
    pub data: Vec<f64>,
    /// Array extents.
    pub shape: FieldShape,
}

impl Field {
    /// Allocate a zeroed field.
    pub fn zeros(shape: FieldShape) -> Self {
        Self {
            data: vec![0.0; shape.len()],
            shape,
        }
    }

    /// Value at point (i, j, k).
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.shape.index(i, j, k)]
    }

    /// Set value at point (i, j, k).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.shape.index(i, j, k);
        self.data[idx] = value;
    }
}
