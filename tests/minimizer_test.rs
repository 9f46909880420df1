//! End-to-end tests for the conjugate-gradient/Lanczos minimizer.
//!
//! Drives full inner loops against a quadratic cost function with a
//! known spectrum and against the biharmonic tracer-mixing propagator
//! pair, and exercises the fatal breakdown path.

use is4dvar::{
    AdjointModel, CostModel, FieldKind, LandMask, MemoryStore, Minimizer, MinimizerConfig,
    MinimizerError, PropagationError, RecordIndex, StaggeredGrid, StateCapabilities, StateStore,
    StateVector, TangentLinearModel, TlAdCostModel, TracerMix4,
};

/// Write a flat value sequence into a state vector, field by field in
/// canonical order.
fn set_flat(v: &mut StateVector, vals: &[f64]) {
    let mut it = vals.iter();
    for (_, f) in v.iter_mut() {
        for x in f.data.iter_mut() {
            *x = *it.next().expect("value list shorter than state");
        }
    }
}

/// Read a state vector out as a flat value sequence.
fn flat(v: &StateVector) -> Vec<f64> {
    let mut out = Vec::with_capacity(v.n_points());
    for (_, f) in v.iter() {
        out.extend_from_slice(&f.data);
    }
    out
}

/// Quadratic cost with a diagonal Hessian: the observation gradient at
/// increment `x` is `H x + g0`, the background term is folded in (zero).
struct QuadraticModel {
    eigen: Vec<f64>,
    g0: Vec<f64>,
    mask: LandMask,
}

impl CostModel for QuadraticModel {
    fn observation_gradient(
        &mut self,
        increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError> {
        let x = flat(increment);
        let g: Vec<f64> = x
            .iter()
            .zip(self.eigen.iter())
            .zip(self.g0.iter())
            .map(|((x, e), g0)| e * x + g0)
            .collect();
        set_flat(out, &g);
        Ok(())
    }

    fn background_gradient(
        &mut self,
        _increment: &StateVector,
        out: &mut StateVector,
    ) -> Result<(), PropagationError> {
        out.fill(0.0, &self.mask);
        Ok(())
    }
}

/// 2x2 barotropic setup: 4 free-surface + 2 ubar + 2 vbar points.
fn quadratic_setup() -> (StaggeredGrid, LandMask, StateCapabilities, QuadraticModel) {
    let grid = StaggeredGrid::uniform(2, 2, 1);
    let mask = LandMask::all_water(2, 2);
    let caps = StateCapabilities::barotropic();
    let model = QuadraticModel {
        eigen: vec![1.0, 4.0, 9.0, 1.0, 4.0, 9.0, 1.0, 4.0],
        g0: vec![-2.78, -0.4, -2.58, -2.46, -0.45, 1.96, -2.26, -1.66],
        mask: mask.clone(),
    };
    (grid, mask, caps, model)
}

#[test]
fn test_recovers_known_hessian_spectrum() {
    let (grid, mask, caps, mut model) = quadratic_setup();
    // Three distinct eigenvalues: the Krylov space closes after three
    // curvature estimates, analysed on the fourth inner iteration.
    let config = MinimizerConfig::new(4).with_grad_err(1e-6).with_hevec_err(1e-6);
    let mut minimizer = Minimizer::new(grid, mask, config);

    let mut store = MemoryStore::new();
    let mut evec_store = MemoryStore::with_overwrite();
    let summary = minimizer
        .run(&mut model, &caps, &mut store, Some(&mut evec_store))
        .unwrap();

    let last = summary.reports.last().unwrap();
    let ritz = last.ritz.as_ref().unwrap();
    assert_eq!(ritz.values.len(), 3);
    for (v, expected) in ritz.values.iter().zip([1.0, 4.0, 9.0].iter()) {
        assert!(
            (v - expected).abs() < 1e-8,
            "ritz value {v} vs expected {expected}"
        );
    }
    assert_eq!(ritz.n_converged, 3);
}

#[test]
fn test_preduc_is_non_increasing() {
    let (grid, mask, caps, mut model) = quadratic_setup();
    let config = MinimizerConfig::new(4);
    let mut minimizer = Minimizer::new(grid, mask, config);

    let mut store = MemoryStore::new();
    let summary = minimizer.run(&mut model, &caps, &mut store, None).unwrap();

    let reductions: Vec<f64> = summary
        .reports
        .iter()
        .filter_map(|r| r.preduc)
        .collect();
    assert_eq!(reductions.len(), 3);
    for pair in reductions.windows(2) {
        assert!(
            pair[1] <= pair[0] + 1e-12,
            "preduc increased: {} -> {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_final_increment_minimizes_quadratic() {
    let (grid, mask, caps, mut model) = quadratic_setup();
    let eigen = model.eigen.clone();
    let g0 = model.g0.clone();
    let config = MinimizerConfig::new(4);
    let mut minimizer = Minimizer::new(grid, mask, config);

    let mut store = MemoryStore::new();
    let summary = minimizer.run(&mut model, &caps, &mut store, None).unwrap();

    // The assembled increment is the minimizer of the quadratic:
    // x* = -H^{-1} g0.
    let x = flat(&summary.increment);
    for ((x, e), g0) in x.iter().zip(eigen.iter()).zip(g0.iter()) {
        let expected = -g0 / e;
        assert!(
            (x - expected).abs() < 1e-8,
            "increment component {x} vs {expected}"
        );
    }
}

#[test]
fn test_lanczos_vectors_stay_orthonormal() {
    let (grid, mask, caps, mut model) = quadratic_setup();
    // Three iterations: the basis is still well away from the invariant
    // subspace, so every record is a clean Lanczos vector.
    let config = MinimizerConfig::new(3).with_orthogonality_check(true);
    let mut minimizer = Minimizer::new(grid.clone(), mask.clone(), config);

    let mut store = MemoryStore::new();
    let summary = minimizer.run(&mut model, &caps, &mut store, None).unwrap();

    // Self-test residuals reported by the engine are at round-off.
    for report in &summary.reports {
        if let Some(ref residuals) = report.orthogonality {
            for r in residuals {
                assert!(r.abs() < 1e-10, "orthogonality residual {r}");
            }
        }
    }

    // Cross-check straight from the persisted records.
    let caps = StateCapabilities::barotropic();
    let mut a = StateVector::allocate(&grid, &caps);
    let mut b = StateVector::allocate(&grid, &caps);
    for i in 1..=3usize {
        for j in 1..=3usize {
            store.read(RecordIndex::new(i), &mut a).unwrap();
            store.read(RecordIndex::new(j), &mut b).unwrap();
            let dot = a.dot(&b, &grid, &mask);
            let expected = if i == j { 1.0 } else { 0.0 };
            assert!(
                (dot - expected).abs() < 1e-10,
                "<q{i}, q{j}> = {dot}"
            );
        }
    }
}

#[test]
fn test_hessian_eigenvectors_are_eigenvectors() {
    let (grid, mask, caps, mut model) = quadratic_setup();
    let eigen = model.eigen.clone();
    let config = MinimizerConfig::new(4).with_grad_err(1e-6).with_hevec_err(1e-6);
    let mut minimizer = Minimizer::new(grid.clone(), mask.clone(), config);

    let mut store = MemoryStore::new();
    let mut evec_store = MemoryStore::with_overwrite();
    let summary = minimizer
        .run(&mut model, &caps, &mut store, Some(&mut evec_store))
        .unwrap();

    // Largest converged eigenvalue first.
    assert_eq!(summary.eigenpairs.len(), 3);
    assert!((summary.eigenpairs[0].value - 9.0).abs() < 1e-8);
    assert!((summary.eigenpairs[2].value - 1.0).abs() < 1e-8);

    let mut v = StateVector::allocate(&grid, &caps);
    for pair in &summary.eigenpairs {
        evec_store.read(pair.record, &mut v).unwrap();
        assert!((v.norm(&grid, &mask) - 1.0).abs() < 1e-10);
        // H v = lambda v, applied through the diagonal test Hessian.
        let vals = flat(&v);
        for (x, e) in vals.iter().zip(eigen.iter()) {
            assert!(
                (e * x - pair.value * x).abs() < 1e-6,
                "component {x} of eigenvector for {} mixes eigenspaces",
                pair.value
            );
        }
        // Persisted metadata matches.
        let meta = evec_store.ritz_pair(pair.record).unwrap();
        assert!((meta.value - pair.value).abs() < 1e-14);
    }
}

#[test]
fn test_negative_curvature_aborts_without_corrupting_store() {
    let grid = StaggeredGrid::uniform(2, 2, 1);
    let mask = LandMask::all_water(2, 2);
    let caps = StateCapabilities::barotropic();
    // H = -0.5 I: the first curvature estimate is exactly -0.5.
    let mut model = QuadraticModel {
        eigen: vec![-0.5; 8],
        g0: vec![1.0, -0.5, 0.25, 2.0, -1.0, 0.5, 1.5, -2.0],
        mask: mask.clone(),
    };
    let config = MinimizerConfig::new(3);
    let mut minimizer = Minimizer::new(grid, mask, config);

    let mut store = MemoryStore::new();
    let err = minimizer
        .run(&mut model, &caps, &mut store, None)
        .unwrap_err();

    match err {
        MinimizerError::IndefiniteHessian { iteration, delta } => {
            assert_eq!(iteration, 1);
            assert!((delta + 0.5).abs() < 1e-10, "delta = {delta}");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Only the iteration-0 record exists; nothing partial was written
    // for the failed iteration.
    assert_eq!(store.len(), 1);
    assert!(store.contains(RecordIndex::new(1)));
    assert!(!store.contains(RecordIndex::new(2)));
}

#[test]
fn test_inner_loop_with_mixing_propagators_and_land() {
    // Full pipeline: TL/AD biharmonic mixing propagators composed into a
    // cost model, on a grid with land points.
    let nx = 6;
    let ny = 5;
    let mut rho = vec![true; nx * ny];
    rho[nx + 2] = false;
    rho[3 * nx + 4] = false;
    let grid = StaggeredGrid::uniform(nx, ny, 2);
    let mask = LandMask::from_rho(nx, ny, rho);
    let caps = StateCapabilities::baroclinic(1);

    let tl = TracerMix4::new(grid.clone(), mask.clone(), 0.05, 1.0);
    let ad = TracerMix4::new(grid.clone(), mask.clone(), 0.05, 1.0);

    let mut innovation = StateVector::allocate(&grid, &caps);
    for (i, (_, f)) in innovation.iter_mut().enumerate() {
        for (p, x) in f.data.iter_mut().enumerate() {
            *x = ((i * 11 + p) as f64 * 0.43).sin();
        }
    }
    innovation.scale(1.0, &mask); // zero the land points
    let mut model = TlAdCostModel::new(tl, ad, innovation, mask.clone());

    let config = MinimizerConfig::new(4).with_orthogonality_check(true);
    let mut minimizer = Minimizer::new(grid.clone(), mask.clone(), config);

    let mut store = MemoryStore::new();
    let summary = minimizer.run(&mut model, &caps, &mut store, None).unwrap();

    // H = I + B'B is positive definite: every curvature estimate is
    // positive and at least 1.
    for report in &summary.reports {
        if let Some(delta) = report.delta {
            assert!(delta >= 1.0 - 1e-10, "delta = {delta}");
        }
        if let Some(ref residuals) = report.orthogonality {
            for r in residuals {
                assert!(r.abs() < 1e-10);
            }
        }
    }

    // Masking invariant: land points are exactly zero in the increment
    // and in every persisted record.
    let zeta = summary.increment.field(FieldKind::FreeSurface);
    assert_eq!(zeta.get(2, 1, 0), 0.0);
    assert_eq!(zeta.get(4, 3, 0), 0.0);

    let mut rec = StateVector::allocate(&grid, &caps);
    for r in 1..=4usize {
        store.read(RecordIndex::new(r), &mut rec).unwrap();
        assert_eq!(rec.field(FieldKind::FreeSurface).get(2, 1, 0), 0.0);
        assert_eq!(rec.field(FieldKind::Tracer(0.into())).get(2, 1, 1), 0.0);
    }
}

#[test]
fn test_adjoint_pair_consistency_through_traits() {
    // The propagator pair used above is mutually adjoint through the
    // trait objects the minimizer sees.
    let grid = StaggeredGrid::uniform(5, 5, 1);
    let mask = LandMask::all_water(5, 5);
    let caps = StateCapabilities::baroclinic(1);
    let mut tl = TracerMix4::new(grid.clone(), mask.clone(), 0.03, 1.0);
    let mut ad = TracerMix4::new(grid.clone(), mask.clone(), 0.03, 1.0);

    let mut x = StateVector::allocate(&grid, &caps);
    let mut y = StateVector::allocate(&grid, &caps);
    for (i, (_, f)) in x.iter_mut().enumerate() {
        for (p, v) in f.data.iter_mut().enumerate() {
            *v = ((i + 3 * p) as f64 * 0.71).cos();
        }
    }
    for (i, (_, f)) in y.iter_mut().enumerate() {
        for (p, v) in f.data.iter_mut().enumerate() {
            *v = ((2 * i + p) as f64 * 0.29).sin();
        }
    }

    let mut tlx = StateVector::allocate(&grid, &caps);
    let mut ady = StateVector::allocate(&grid, &caps);
    TangentLinearModel::run(&mut tl, &x, &mut tlx).unwrap();
    AdjointModel::run(&mut ad, &y, &mut ady).unwrap();

    let lhs = tlx.dot(&y, &grid, &mask);
    let rhs = x.dot(&ady, &grid, &mask);
    assert!((lhs - rhs).abs() <= 1e-12 * lhs.abs().max(1.0));
}
