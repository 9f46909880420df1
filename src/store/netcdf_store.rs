//! NetCDF-backed record store.
//!
//! Two on-disk layouts, selected by configuration:
//!
//! - [`FileLayout::RecordPerFile`]: one file per record, named
//!   `<base>_NNN.nc` with a zero-padded record number;
//! - [`FileLayout::SingleFile`]: one file with an unlimited `record`
//!   dimension shared by all fields.
//!
//! Fields are stored as `f64` — records must read back bit-identically
//! for the Gram-Schmidt passes, so no narrowing to `f32` happens on the
//! way to disk. Each field variable is flattened over its staggered
//! extents; the spatial structure lives in the grid collaborator, not in
//! the record encoding.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::state::StateVector;
use crate::types::RecordIndex;

use super::{RitzPair, StateStore, StoreError};

/// On-disk layout of the record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileLayout {
    /// One NetCDF file per record (`<base>_NNN.nc`).
    RecordPerFile,
    /// One NetCDF file holding all records (`<base>.nc`).
    SingleFile,
}

/// Configuration for a [`NetcdfStore`].
#[derive(Clone, Debug)]
pub struct NetcdfStoreConfig {
    /// Base path without extension, e.g. `run/adjoint_gradients`.
    pub base: PathBuf,
    /// File layout.
    pub layout: FileLayout,
    /// Title attribute written to created files.
    pub title: Option<String>,
    /// Permit record replacement (two-pass eigenvector workflow only).
    pub allow_overwrite: bool,
}

impl NetcdfStoreConfig {
    /// Create a configuration with the given base path and layout.
    pub fn new(base: impl Into<PathBuf>, layout: FileLayout) -> Self {
        Self {
            base: base.into(),
            layout,
            title: None,
            allow_overwrite: false,
        }
    }

    /// Set the title attribute.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Permit record replacement.
    pub fn with_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }
}

/// NetCDF-backed implementation of [`StateStore`].
pub struct NetcdfStore {
    config: NetcdfStoreConfig,
    /// Records written by this store instance, in write order.
    written: Vec<usize>,
}

impl NetcdfStore {
    /// Create a store with the given configuration.
    pub fn create(config: NetcdfStoreConfig) -> Self {
        Self {
            config,
            written: Vec::new(),
        }
    }

    fn record_path(&self, rec: RecordIndex) -> PathBuf {
        match self.config.layout {
            FileLayout::RecordPerFile => {
                let stem = self
                    .config
                    .base
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "record".to_string());
                self.config
                    .base
                    .with_file_name(format!("{}_{:03}.nc", stem, rec.get()))
            }
            FileLayout::SingleFile => self.config.base.with_extension("nc"),
        }
    }

    fn annotate(&self, file: &mut netcdf::FileMut) -> Result<(), StoreError> {
        file.add_attribute("source", "is4dvar")?;
        if let Some(ref title) = self.config.title {
            file.add_attribute("title", title.as_str())?;
        }
        let now = Utc::now();
        file.add_attribute(
            "history",
            format!("{}: Created by is4dvar", now.format("%Y-%m-%d %H:%M:%S UTC")).as_str(),
        )?;
        Ok(())
    }

    fn write_impl(
        &mut self,
        rec: RecordIndex,
        v: &StateVector,
        ritz: Option<RitzPair>,
    ) -> Result<(), StoreError> {
        if !self.config.allow_overwrite && self.contains(rec) {
            return Err(StoreError::RecordOverwrite { record: rec });
        }
        let path = self.record_path(rec);
        match self.config.layout {
            FileLayout::RecordPerFile => self.write_record_file(&path, rec, v, ritz)?,
            FileLayout::SingleFile => self.write_single_file(&path, rec, v, ritz)?,
        }
        if !self.written.contains(&rec.get()) {
            self.written.push(rec.get());
        }
        Ok(())
    }

    fn write_record_file(
        &self,
        path: &Path,
        _rec: RecordIndex,
        v: &StateVector,
        ritz: Option<RitzPair>,
    ) -> Result<(), StoreError> {
        let mut file = netcdf::create(path)?;
        for (kind, field) in v.iter() {
            let name = kind.name();
            let dim = format!("{}_points", name);
            file.add_dimension(&dim, field.shape.len())?;
            let mut var = file.add_variable::<f64>(&name, &[dim.as_str()])?;
            var.put_values(&field.data, ..)?;
        }
        if let Some(pair) = ritz {
            file.add_dimension("scalar", 1)?;
            let mut var = file.add_variable::<f64>("Ritz", &["scalar"])?;
            var.put_values(&[pair.value], ..)?;
            let mut var = file.add_variable::<f64>("Ritz_error", &["scalar"])?;
            var.put_values(&[pair.error_bound], ..)?;
        }
        self.annotate(&mut file)?;
        Ok(())
    }

    fn write_single_file(
        &self,
        path: &Path,
        rec: RecordIndex,
        v: &StateVector,
        ritz: Option<RitzPair>,
    ) -> Result<(), StoreError> {
        let mut file = if path.exists() {
            netcdf::append(path)?
        } else {
            let mut file = netcdf::create(path)?;
            file.add_unlimited_dimension("record")?;
            for (kind, field) in v.iter() {
                let name = kind.name();
                let dim = format!("{}_points", name);
                file.add_dimension(&dim, field.shape.len())?;
                file.add_variable::<f64>(&name, &["record", dim.as_str()])?;
            }
            file.add_variable::<f64>("Ritz", &["record"])?;
            file.add_variable::<f64>("Ritz_error", &["record"])?;
            self.annotate(&mut file)?;
            file
        };

        // Record numbers are 1-based; NetCDF record slots are 0-based.
        let slot = rec.get() - 1;
        for (kind, field) in v.iter() {
            let name = kind.name();
            let mut var =
                file.variable_mut(&name)
                    .ok_or_else(|| StoreError::MissingVariable {
                        name: name.to_string(),
                        record: rec,
                        location: path.display().to_string(),
                    })?;
            var.put_values(&field.data, (slot, ..))?;
        }
        if let Some(pair) = ritz {
            let mut var = file
                .variable_mut("Ritz")
                .ok_or_else(|| StoreError::MissingVariable {
                    name: "Ritz".to_string(),
                    record: rec,
                    location: path.display().to_string(),
                })?;
            var.put_value(pair.value, [slot])?;
            let mut var =
                file.variable_mut("Ritz_error")
                    .ok_or_else(|| StoreError::MissingVariable {
                        name: "Ritz_error".to_string(),
                        record: rec,
                        location: path.display().to_string(),
                    })?;
            var.put_value(pair.error_bound, [slot])?;
        }
        Ok(())
    }
}

impl StateStore for NetcdfStore {
    fn write(&mut self, rec: RecordIndex, v: &StateVector) -> Result<(), StoreError> {
        self.write_impl(rec, v, None)
    }

    fn read(&mut self, rec: RecordIndex, out: &mut StateVector) -> Result<(), StoreError> {
        let path = self.record_path(rec);
        if !self.contains(rec) || !path.exists() {
            return Err(StoreError::MissingRecord {
                record: rec,
                location: path.display().to_string(),
            });
        }
        let file = netcdf::open(&path)?;
        for (kind, field) in out.iter_mut() {
            let name = kind.name();
            let var = file
                .variable(&name)
                .ok_or_else(|| StoreError::MissingVariable {
                    name: name.to_string(),
                    record: rec,
                    location: path.display().to_string(),
                })?;
            let data: Vec<f64> = match self.config.layout {
                FileLayout::RecordPerFile => var.get_values(..)?,
                FileLayout::SingleFile => var.get_values((rec.get() - 1, ..))?,
            };
            if data.len() != field.shape.len() {
                return Err(StoreError::InvalidData(format!(
                    "variable {} has {} points, expected {}",
                    name,
                    data.len(),
                    field.shape.len()
                )));
            }
            field.data.copy_from_slice(&data);
        }
        Ok(())
    }

    fn contains(&self, rec: RecordIndex) -> bool {
        self.written.contains(&rec.get())
    }

    fn len(&self) -> usize {
        self.written.len()
    }

    fn write_eigenpair(
        &mut self,
        rec: RecordIndex,
        v: &StateVector,
        ritz: RitzPair,
    ) -> Result<(), StoreError> {
        self.write_impl(rec, v, Some(ritz))
    }
}
