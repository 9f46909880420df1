//! Persisted gradient-record store.
//!
//! The Lanczos recurrence keeps only O(1) state vectors resident; every
//! previous orthonormal gradient is re-read from a [`StateStore`] during
//! the Gram-Schmidt passes. Records are written once per run and must
//! read back bit-identically — re-orthogonalization correctness depends
//! on it.
//!
//! Two backings are provided: an in-memory store and, behind the
//! `netcdf` feature, a NetCDF store with either one file per record or a
//! single multi-record file. The choice of backing and layout is a
//! configuration option, never a code-path fork in the minimizer.

mod memory;
#[cfg(feature = "netcdf")]
mod netcdf_store;

pub use memory::MemoryStore;
#[cfg(feature = "netcdf")]
pub use netcdf_store::{FileLayout, NetcdfStore, NetcdfStoreConfig};

use thiserror::Error;

use crate::state::StateVector;
use crate::types::RecordIndex;

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// Requested record was never written
    #[error("record {record} not found in {location}")]
    MissingRecord {
        /// The requested record
        record: RecordIndex,
        /// File name or store description
        location: String,
    },

    /// A named field of the record is absent
    #[error("variable {name} missing for record {record} in {location}")]
    MissingVariable {
        /// Variable name
        name: String,
        /// The requested record
        record: RecordIndex,
        /// File name or store description
        location: String,
    },

    /// Stored data does not match the expected extents
    #[error("invalid record data: {0}")]
    InvalidData(String),

    /// Attempt to rewrite a record in a write-once store
    #[error("record {record} already written; records are write-once per run")]
    RecordOverwrite {
        /// The offending record
        record: RecordIndex,
    },
}

/// A converged Ritz eigenvalue and its a-posteriori error bound,
/// persisted alongside a Hessian eigenvector record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RitzPair {
    /// Ritz eigenvalue.
    pub value: f64,
    /// Error bound from the trailing Lanczos coefficient.
    pub error_bound: f64,
}

/// Persistence of state vectors keyed by record number.
///
/// Write-once semantics are the default: rewriting an existing record is
/// an error unless the store was explicitly created for the two-pass
/// eigenvector workflow, which replaces raw accumulations with their
/// orthonormalized form.
pub trait StateStore {
    /// Persist `v` under logical record `rec`.
    fn write(&mut self, rec: RecordIndex, v: &StateVector) -> Result<(), StoreError>;

    /// Load a previously written record into `out`.
    ///
    /// `out` must have the field set and shapes of the run; a mismatch
    /// against the stored record is reported as [`StoreError::InvalidData`].
    fn read(&mut self, rec: RecordIndex, out: &mut StateVector) -> Result<(), StoreError>;

    /// Whether a record has been written.
    fn contains(&self, rec: RecordIndex) -> bool;

    /// Number of records written so far.
    fn len(&self) -> usize;

    /// Whether the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist `v` under `rec` together with its Ritz value and error
    /// bound (Hessian eigenvector output records).
    fn write_eigenpair(
        &mut self,
        rec: RecordIndex,
        v: &StateVector,
        ritz: RitzPair,
    ) -> Result<(), StoreError>;
}
