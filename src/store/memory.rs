//! In-memory record store.

use std::collections::BTreeMap;

use crate::state::StateVector;
use crate::types::RecordIndex;

use super::{RitzPair, StateStore, StoreError};

/// Record store backed by process memory.
///
/// Reads return bit-identical content by construction. Used for
/// idealized runs and tests, and as the reference behavior for the
/// file-backed stores.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<usize, StateVector>,
    ritz: BTreeMap<usize, RitzPair>,
    allow_overwrite: bool,
}

impl MemoryStore {
    /// Create an empty write-once store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that permits record replacement.
    ///
    /// Needed only by the two-pass Hessian eigenvector workflow; gradient
    /// records stay write-once.
    pub fn with_overwrite() -> Self {
        Self {
            allow_overwrite: true,
            ..Self::default()
        }
    }

    /// Ritz metadata attached to an eigenvector record, if any.
    pub fn ritz_pair(&self, rec: RecordIndex) -> Option<RitzPair> {
        self.ritz.get(&rec.get()).copied()
    }
}

impl StateStore for MemoryStore {
    fn write(&mut self, rec: RecordIndex, v: &StateVector) -> Result<(), StoreError> {
        if !self.allow_overwrite && self.records.contains_key(&rec.get()) {
            return Err(StoreError::RecordOverwrite { record: rec });
        }
        self.records.insert(rec.get(), v.clone());
        Ok(())
    }

    fn read(&mut self, rec: RecordIndex, out: &mut StateVector) -> Result<(), StoreError> {
        let stored = self
            .records
            .get(&rec.get())
            .ok_or_else(|| StoreError::MissingRecord {
                record: rec,
                location: "memory store".to_string(),
            })?;
        for ((kind, dst), (stored_kind, src)) in out.iter_mut().zip(stored.iter()) {
            if kind != stored_kind || dst.shape != src.shape {
                return Err(StoreError::InvalidData(format!(
                    "field {} does not match the stored record layout",
                    kind.name()
                )));
            }
            dst.data.copy_from_slice(&src.data);
        }
        Ok(())
    }

    fn contains(&self, rec: RecordIndex) -> bool {
        self.records.contains_key(&rec.get())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn write_eigenpair(
        &mut self,
        rec: RecordIndex,
        v: &StateVector,
        ritz: RitzPair,
    ) -> Result<(), StoreError> {
        self.write(rec, v)?;
        self.ritz.insert(rec.get(), ritz);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{LandMask, StaggeredGrid};
    use crate::state::StateCapabilities;

    fn sample_vector() -> (StaggeredGrid, LandMask, StateVector) {
        let grid = StaggeredGrid::uniform(4, 3, 2);
        let mask = LandMask::all_water(4, 3);
        let caps = StateCapabilities::baroclinic(1);
        let mut v = StateVector::allocate(&grid, &caps);
        for (i, (_, f)) in v.iter_mut().enumerate() {
            for (p, x) in f.data.iter_mut().enumerate() {
                *x = ((i * 31 + p) as f64).sin() * 1e-3;
            }
        }
        (grid, mask, v)
    }

    #[test]
    fn test_roundtrip_bit_identical() {
        let (_, _, v) = sample_vector();
        let mut store = MemoryStore::new();
        store.write(RecordIndex::new(1), &v).unwrap();

        let mut out = v.clone();
        out.iter_mut().for_each(|(_, f)| f.data.fill(0.0));
        store.read(RecordIndex::new(1), &mut out).unwrap();

        for ((_, a), (_, b)) in out.iter().zip(v.iter()) {
            for (x, y) in a.data.iter().zip(b.data.iter()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_write_once_enforced() {
        let (_, _, v) = sample_vector();
        let mut store = MemoryStore::new();
        store.write(RecordIndex::new(1), &v).unwrap();
        let err = store.write(RecordIndex::new(1), &v).unwrap_err();
        assert!(matches!(err, StoreError::RecordOverwrite { .. }));
    }

    #[test]
    fn test_overwrite_store_replaces() {
        let (_, mask, v) = sample_vector();
        let mut store = MemoryStore::with_overwrite();
        store.write(RecordIndex::new(1), &v).unwrap();
        let mut v2 = v.clone();
        v2.scale(2.0, &mask);
        store.write(RecordIndex::new(1), &v2).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_record_error() {
        let (_, _, v) = sample_vector();
        let mut store = MemoryStore::new();
        let mut out = v.clone();
        let err = store.read(RecordIndex::new(7), &mut out).unwrap_err();
        assert!(matches!(err, StoreError::MissingRecord { .. }));
        assert!(format!("{}", err).contains("rec7"));
    }

    #[test]
    fn test_eigenpair_metadata() {
        let (_, _, v) = sample_vector();
        let mut store = MemoryStore::with_overwrite();
        let pair = RitzPair {
            value: 4.0,
            error_bound: 1e-9,
        };
        store.write_eigenpair(RecordIndex::new(1), &v, pair).unwrap();
        assert_eq!(store.ritz_pair(RecordIndex::new(1)), Some(pair));
    }
}
