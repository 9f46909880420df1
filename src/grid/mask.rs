//! Land/sea masking on the staggered grid.
//!
//! Classifies each rho point as water or land and derives the u/v point
//! masks from the rho mask. Every mutating state-vector operation
//! re-applies the mask so that land points stay exactly zero.

/// Land mask over rho, u and v points.
///
/// A u point is wet only when both adjacent rho points are wet; likewise
/// for v points. This is the usual staggered-grid convention and
/// guarantees that momentum points never straddle a coastline.
#[derive(Clone)]
pub struct LandMask {
    /// True if rho point is water, length `nx * ny`.
    rho: Vec<bool>,
    /// True if u point is water, length `(nx - 1) * ny`.
    u: Vec<bool>,
    /// True if v point is water, length `nx * (ny - 1)`.
    v: Vec<bool>,
    nx: usize,
    ny: usize,
}

impl LandMask {
    /// Create a mask where every point is water.
    pub fn all_water(nx: usize, ny: usize) -> Self {
        Self {
            rho: vec![true; nx * ny],
            u: vec![true; (nx - 1) * ny],
            v: vec![true; nx * (ny - 1)],
            nx,
            ny,
        }
    }

    /// Create a mask from a rho-point water flags vector.
    ///
    /// The u and v masks are derived: wet only where both neighbouring
    /// rho points are wet.
    pub fn from_rho(nx: usize, ny: usize, rho: Vec<bool>) -> Self {
        assert_eq!(rho.len(), nx * ny, "rho mask length mismatch");

        let mut u = vec![false; (nx - 1) * ny];
        for j in 0..ny {
            for i in 0..nx - 1 {
                u[j * (nx - 1) + i] = rho[j * nx + i] && rho[j * nx + i + 1];
            }
        }

        let mut v = vec![false; nx * (ny - 1)];
        for j in 0..ny - 1 {
            for i in 0..nx {
                v[j * nx + i] = rho[j * nx + i] && rho[(j + 1) * nx + i];
            }
        }

        Self { rho, u, v, nx, ny }
    }

    /// Check if rho point (i, j) is water.
    #[inline]
    pub fn is_wet_rho(&self, i: usize, j: usize) -> bool {
        self.rho[j * self.nx + i]
    }

    /// Check if u point (i, j) is water.
    #[inline]
    pub fn is_wet_u(&self, i: usize, j: usize) -> bool {
        self.u[j * (self.nx - 1) + i]
    }

    /// Check if v point (i, j) is water.
    #[inline]
    pub fn is_wet_v(&self, i: usize, j: usize) -> bool {
        self.v[j * self.nx + i]
    }

    /// Multiplicative mask factor at rho point (i, j): 1 for water, 0 for land.
    #[inline]
    pub fn factor_rho(&self, i: usize, j: usize) -> f64 {
        if self.is_wet_rho(i, j) { 1.0 } else { 0.0 }
    }

    /// Multiplicative mask factor at u point (i, j).
    #[inline]
    pub fn factor_u(&self, i: usize, j: usize) -> f64 {
        if self.is_wet_u(i, j) { 1.0 } else { 0.0 }
    }

    /// Multiplicative mask factor at v point (i, j).
    #[inline]
    pub fn factor_v(&self, i: usize, j: usize) -> f64 {
        if self.is_wet_v(i, j) { 1.0 } else { 0.0 }
    }

    /// Number of wet rho points.
    pub fn wet_count(&self) -> usize {
        self.rho.iter().filter(|&&w| w).count()
    }

    /// Number of dry rho points.
    pub fn dry_count(&self) -> usize {
        self.rho.len() - self.wet_count()
    }

    /// Get statistics about the mask.
    pub fn statistics(&self) -> LandMaskStatistics {
        LandMaskStatistics {
            total_rho: self.rho.len(),
            wet_rho: self.wet_count(),
            wet_u: self.u.iter().filter(|&&w| w).count(),
            wet_v: self.v.iter().filter(|&&w| w).count(),
        }
    }
}

/// Statistics about a land mask.
#[derive(Debug, Clone)]
pub struct LandMaskStatistics {
    /// Total number of rho points
    pub total_rho: usize,
    /// Number of wet rho points
    pub wet_rho: usize,
    /// Number of wet u points
    pub wet_u: usize,
    /// Number of wet v points
    pub wet_v: usize,
}

impl std::fmt::Display for LandMaskStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Land Mask Statistics:")?;
        writeln!(
            f,
            "  Wet rho points: {} / {} ({:.1}%)",
            self.wet_rho,
            self.total_rho,
            100.0 * self.wet_rho as f64 / self.total_rho as f64
        )?;
        writeln!(f, "  Wet u points: {}", self.wet_u)?;
        write!(f, "  Wet v points: {}", self.wet_v)
    }
}
