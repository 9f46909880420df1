//! Whole-state arithmetic.
//!
//! These are the building blocks of the minimizer: in-place scaling,
//! masked linear combinations and the metric-weighted inner product. The
//! land mask is re-applied after every mutating operation so that land
//! points are exactly zero at all times, and the inner product combines
//! per-row partial sums in a fixed order so that repeated evaluations are
//! bit-identical.

use crate::grid::{LandMask, StaggeredGrid};
use crate::reduction::sum_over_partitions;

use super::field::{Field, FieldKind, Staggering};
use super::vector::StateVector;

#[inline]
fn mask_factor(mask: &LandMask, staggering: Staggering, i: usize, j: usize) -> f64 {
    match staggering {
        Staggering::Rho => mask.factor_rho(i, j),
        Staggering::UPoint => mask.factor_u(i, j),
        Staggering::VPoint => mask.factor_v(i, j),
    }
}

#[inline]
fn point_weight(
    grid: &StaggeredGrid,
    kind: &FieldKind,
    i: usize,
    j: usize,
    k: usize,
) -> f64 {
    if kind.is_three_d() {
        match kind.staggering() {
            Staggering::Rho => grid.volume_rho(i, j, k),
            Staggering::UPoint => grid.volume_u(i, j, k),
            Staggering::VPoint => grid.volume_v(i, j, k),
        }
    } else {
        match kind.staggering() {
            Staggering::Rho => grid.area_rho(i, j),
            Staggering::UPoint => grid.area_u(i, j),
            Staggering::VPoint => grid.area_v(i, j),
        }
    }
}

fn for_each_point(field: &mut Field, staggering: Staggering, mask: &LandMask, f: impl Fn(f64) -> f64) {
    let shape = field.shape;
    for k in 0..shape.nz {
        for j in 0..shape.ny {
            for i in 0..shape.nx {
                let idx = shape.index(i, j, k);
                field.data[idx] = f(field.data[idx]) * mask_factor(mask, staggering, i, j);
            }
        }
    }
}

impl StateVector {
    /// Set every field to a scalar constant; land points stay zero.
    pub fn fill(&mut self, value: f64, mask: &LandMask) {
        for (kind, field) in self.iter_mut() {
            let staggering = kind.staggering();
            for_each_point(field, staggering, mask, |_| value);
        }
    }

    /// Multiply every field by `factor` in place; re-apply the mask.
    pub fn scale(&mut self, factor: f64, mask: &LandMask) {
        for (kind, field) in self.iter_mut() {
            let staggering = kind.staggering();
            for_each_point(field, staggering, mask, |x| x * factor);
        }
    }

    /// `self = self + factor * other`, field by field; re-apply the mask.
    pub fn add_scaled(&mut self, other: &StateVector, factor: f64, mask: &LandMask) {
        self.linear_combine(1.0, other, factor, mask);
    }

    /// `self = fac1 * self + fac2 * other`, field by field; re-apply the
    /// mask. The destination aliases the first operand by construction.
    pub fn linear_combine(&mut self, fac1: f64, other: &StateVector, fac2: f64, mask: &LandMask) {
        self.assert_compatible(other);
        for ((kind, dst), (_, src)) in self.iter_mut().zip(other.iter()) {
            let staggering = kind.staggering();
            let shape = dst.shape;
            for k in 0..shape.nz {
                for j in 0..shape.ny {
                    for i in 0..shape.nx {
                        let idx = shape.index(i, j, k);
                        let m = mask_factor(mask, staggering, i, j);
                        dst.data[idx] = (fac1 * dst.data[idx] + fac2 * src.data[idx]) * m;
                    }
                }
            }
        }
    }

    /// Deep copy from `src`; re-apply the mask.
    pub fn copy_from(&mut self, src: &StateVector, mask: &LandMask) {
        self.assert_compatible(src);
        for ((kind, dst), (_, s)) in self.iter_mut().zip(src.iter()) {
            dst.data.copy_from_slice(&s.data);
            let staggering = kind.staggering();
            for_each_point(dst, staggering, mask, |x| x);
        }
    }

    /// Metric-weighted inner product over all fields and all water points.
    ///
    /// 2D fields are weighted by cell area, 3D fields by cell volume, so
    /// the scalar agrees with the continuous inner product of the
    /// discretization. Partial sums are accumulated per row and combined
    /// in a fixed order; any two partitions of the same layout agree on
    /// the result.
    pub fn dot(&self, other: &StateVector, grid: &StaggeredGrid, mask: &LandMask) -> f64 {
        self.assert_compatible(other);
        let mut total = 0.0;
        for ((kind, a), (_, b)) in self.iter().zip(other.iter()) {
            let staggering = kind.staggering();
            let shape = a.shape;
            total += sum_over_partitions(shape.ny * shape.nz, |row| {
                let k = row / shape.ny;
                let j = row % shape.ny;
                let mut partial = 0.0;
                for i in 0..shape.nx {
                    let idx = shape.index(i, j, k);
                    let w = point_weight(grid, kind, i, j, k);
                    let m = mask_factor(mask, staggering, i, j);
                    partial += a.data[idx] * b.data[idx] * w * m;
                }
                partial
            });
        }
        total
    }

    /// Metric-weighted norm: `sqrt(<self, self>)`.
    pub fn norm(&self, grid: &StaggeredGrid, mask: &LandMask) -> f64 {
        self.dot(self, grid, mask).sqrt()
    }
}
