//! The model state vector.

use std::collections::BTreeMap;

use crate::grid::StaggeredGrid;

use super::capabilities::StateCapabilities;
use super::field::{Field, FieldKind};

/// One model state: a capability-driven collection of physical fields.
///
/// Allocated once per solver invocation at fixed extents; content is
/// overwritten in place across iterations. Which fields exist is decided
/// by the [`StateCapabilities`] of the run — reading a disabled field is a
/// contract violation, not a recoverable error.
///
/// Fields iterate in the canonical `FieldKind` order, which keeps
/// whole-state reductions deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    fields: BTreeMap<FieldKind, Field>,
}

impl StateVector {
    /// Allocate a zeroed state vector for the given grid and capabilities.
    pub fn allocate(grid: &StaggeredGrid, caps: &StateCapabilities) -> Self {
        let mut fields = BTreeMap::new();
        for kind in caps.field_kinds() {
            fields.insert(kind, Field::zeros(kind.shape(grid)));
        }
        Self { fields }
    }

    /// Number of fields.
    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    /// Total number of points across all fields.
    pub fn n_points(&self) -> usize {
        self.fields.values().map(|f| f.shape.len()).sum()
    }

    /// Iterate over (kind, field) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldKind, &Field)> {
        self.fields.iter()
    }

    /// Iterate mutably over (kind, field) pairs in canonical order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&FieldKind, &mut Field)> {
        self.fields.iter_mut()
    }

    /// Whether a field kind is present.
    pub fn contains(&self, kind: FieldKind) -> bool {
        self.fields.contains_key(&kind)
    }

    /// Borrow a field.
    ///
    /// # Panics
    ///
    /// Panics if the field is not part of this run's capabilities. The
    /// field set is fixed per run, so a missing kind is a programming
    /// error.
    pub fn field(&self, kind: FieldKind) -> &Field {
        self.fields
            .get(&kind)
            .unwrap_or_else(|| panic!("field {} not present in this state vector", kind.name()))
    }

    /// Borrow a field mutably.
    ///
    /// # Panics
    ///
    /// Panics if the field is not part of this run's capabilities.
    pub fn field_mut(&mut self, kind: FieldKind) -> &mut Field {
        self.fields
            .get_mut(&kind)
            .unwrap_or_else(|| panic!("field {} not present in this state vector", kind.name()))
    }

    /// Assert that `other` has the same field set and shapes.
    ///
    /// Sizes are fixed per run, so a mismatch is a programming error and
    /// fails fast.
    pub(crate) fn assert_compatible(&self, other: &StateVector) {
        assert_eq!(
            self.fields.len(),
            other.fields.len(),
            "state vectors carry different field sets"
        );
        for ((ka, fa), (kb, fb)) in self.fields.iter().zip(other.fields.iter()) {
            assert_eq!(ka, kb, "state vectors carry different field sets");
            assert_eq!(
                fa.shape, fb.shape,
                "shape mismatch for field {}",
                ka.name()
            );
        }
    }
}
