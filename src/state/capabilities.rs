//! Run capability descriptor.
//!
//! Which fields a state vector carries depends on how the run is
//! configured: depth-averaged vs. 3D momentum, how many tracers, and
//! whether the surface wind-stress and surface tracer-flux corrections
//! are part of the control vector. The descriptor replaces compile-time
//! switches with a value carried by the run configuration.

use crate::types::TracerIndex;

use super::field::FieldKind;

/// Momentum representation of the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MomentumKind {
    /// Depth-averaged (ubar, vbar), no tracers.
    Barotropic,
    /// Fully 3D (u, v) with tracers.
    Baroclinic,
}

/// The set of field kinds present in every state vector of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateCapabilities {
    /// Momentum representation.
    pub momentum: MomentumKind,
    /// Number of tracers (ignored for barotropic runs).
    pub n_tracers: usize,
    /// Whether wind-stress corrections are part of the control vector.
    pub adjust_wind_stress: bool,
    /// Whether surface tracer-flux corrections are part of the control
    /// vector. Only meaningful for baroclinic runs.
    pub adjust_tracer_flux: bool,
}

impl StateCapabilities {
    /// Depth-averaged configuration: free surface + 2D momentum.
    pub fn barotropic() -> Self {
        Self {
            momentum: MomentumKind::Barotropic,
            n_tracers: 0,
            adjust_wind_stress: false,
            adjust_tracer_flux: false,
        }
    }

    /// 3D configuration with `n_tracers` tracers.
    pub fn baroclinic(n_tracers: usize) -> Self {
        Self {
            momentum: MomentumKind::Baroclinic,
            n_tracers,
            adjust_wind_stress: false,
            adjust_tracer_flux: false,
        }
    }

    /// Enable/disable wind-stress correction fields.
    pub fn with_wind_stress_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_wind_stress = enabled;
        self
    }

    /// Enable/disable surface tracer-flux correction fields.
    pub fn with_tracer_flux_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_tracer_flux = enabled;
        self
    }

    /// The canonical ordered list of field kinds for this configuration.
    pub fn field_kinds(&self) -> Vec<FieldKind> {
        let mut kinds = vec![FieldKind::FreeSurface];
        match self.momentum {
            MomentumKind::Barotropic => {
                kinds.push(FieldKind::UBar);
                kinds.push(FieldKind::VBar);
            }
            MomentumKind::Baroclinic => {
                kinds.push(FieldKind::U);
                kinds.push(FieldKind::V);
                for t in TracerIndex::iter(self.n_tracers) {
                    kinds.push(FieldKind::Tracer(t));
                }
            }
        }
        if self.adjust_wind_stress {
            kinds.push(FieldKind::StressU);
            kinds.push(FieldKind::StressV);
        }
        if self.adjust_tracer_flux && self.momentum == MomentumKind::Baroclinic {
            for t in TracerIndex::iter(self.n_tracers) {
                kinds.push(FieldKind::TracerFlux(t));
            }
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barotropic_kinds() {
        let caps = StateCapabilities::barotropic();
        let kinds = caps.field_kinds();
        assert_eq!(
            kinds,
            vec![FieldKind::FreeSurface, FieldKind::UBar, FieldKind::VBar]
        );
    }

    #[test]
    fn test_baroclinic_with_adjustments() {
        let caps = StateCapabilities::baroclinic(2)
            .with_wind_stress_adjustment(true)
            .with_tracer_flux_adjustment(true);
        let kinds = caps.field_kinds();
        assert_eq!(kinds.len(), 1 + 2 + 2 + 2 + 2);
        assert!(kinds.contains(&FieldKind::StressU));
        assert!(kinds.contains(&FieldKind::TracerFlux(TracerIndex::new(1))));
    }

    #[test]
    fn test_tracer_flux_requires_baroclinic() {
        let caps = StateCapabilities::barotropic().with_tracer_flux_adjustment(true);
        assert!(!caps
            .field_kinds()
            .iter()
            .any(|k| matches!(k, FieldKind::TracerFlux(_))));
    }
}
