//! Record-store contract tests across backings.

use is4dvar::{
    LandMask, MemoryStore, RecordIndex, StaggeredGrid, StateCapabilities, StateStore, StateVector,
    StoreError,
};

fn sample_state(seed: usize) -> (StaggeredGrid, StateVector) {
    let grid = StaggeredGrid::uniform(5, 4, 3);
    let caps = StateCapabilities::baroclinic(2)
        .with_wind_stress_adjustment(true)
        .with_tracer_flux_adjustment(true);
    let mut v = StateVector::allocate(&grid, &caps);
    for (i, (_, f)) in v.iter_mut().enumerate() {
        for (p, x) in f.data.iter_mut().enumerate() {
            // Awkward values on purpose: round-tripping must be exact.
            *x = ((seed + i * 7 + p) as f64 * 0.123456789).sin() * 1.0e-7 + 1.0 / 3.0;
        }
    }
    (grid, v)
}

fn assert_bitwise_equal(a: &StateVector, b: &StateVector) {
    for ((ka, fa), (_, fb)) in a.iter().zip(b.iter()) {
        for (x, y) in fa.data.iter().zip(fb.data.iter()) {
            assert_eq!(x.to_bits(), y.to_bits(), "field {} differs", ka.name());
        }
    }
}

fn exercise_store(store: &mut dyn StateStore) {
    let (_, v1) = sample_state(1);
    let (_, v2) = sample_state(2);

    store.write(RecordIndex::new(1), &v1).unwrap();
    store.write(RecordIndex::new(2), &v2).unwrap();
    assert_eq!(store.len(), 2);
    assert!(store.contains(RecordIndex::new(2)));
    assert!(!store.contains(RecordIndex::new(3)));

    // Repeated reads are bit-identical.
    let mut out = v1.clone();
    for _ in 0..3 {
        store.read(RecordIndex::new(1), &mut out).unwrap();
        assert_bitwise_equal(&out, &v1);
    }
    store.read(RecordIndex::new(2), &mut out).unwrap();
    assert_bitwise_equal(&out, &v2);

    // Write-once.
    let err = store.write(RecordIndex::new(1), &v2).unwrap_err();
    assert!(matches!(err, StoreError::RecordOverwrite { .. }));

    // Distinguishable missing-record error.
    let err = store.read(RecordIndex::new(9), &mut out).unwrap_err();
    assert!(matches!(err, StoreError::MissingRecord { .. }));
}

#[test]
fn test_memory_store_contract() {
    let mut store = MemoryStore::new();
    exercise_store(&mut store);
}

#[cfg(feature = "netcdf")]
mod netcdf_backing {
    use super::*;
    use is4dvar::{FileLayout, NetcdfStore, NetcdfStoreConfig};

    #[test]
    fn test_record_per_file_contract() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            NetcdfStoreConfig::new(dir.path().join("gradients"), FileLayout::RecordPerFile);
        let mut store = NetcdfStore::create(config);
        exercise_store(&mut store);
    }

    #[test]
    fn test_single_file_contract() {
        let dir = tempfile::tempdir().unwrap();
        let config = NetcdfStoreConfig::new(dir.path().join("gradients"), FileLayout::SingleFile);
        let mut store = NetcdfStore::create(config);
        exercise_store(&mut store);
    }
}

#[test]
fn test_masked_content_round_trips() {
    let nx = 5;
    let ny = 4;
    let mut rho = vec![true; nx * ny];
    rho[2 * nx + 3] = false;
    let grid = StaggeredGrid::uniform(nx, ny, 1);
    let mask = LandMask::from_rho(nx, ny, rho);
    let caps = StateCapabilities::barotropic();

    let mut v = StateVector::allocate(&grid, &caps);
    v.fill(1.5, &mask);

    let mut store = MemoryStore::new();
    store.write(RecordIndex::new(1), &v).unwrap();

    let mut out = StateVector::allocate(&grid, &caps);
    store.read(RecordIndex::new(1), &mut out).unwrap();
    assert_eq!(out.field(is4dvar::FieldKind::FreeSurface).get(3, 2, 0), 0.0);
    assert_bitwise_equal(&out, &v);
}
