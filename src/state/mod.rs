//! Model state vectors and their arithmetic.
//!
//! A [`StateVector`] aggregates the physical fields of one model state
//! (free surface, momentum, tracers, optional surface forcing
//! corrections) behind a capability descriptor, and provides the masked,
//! metric-weighted operations the minimizer is built from.

mod capabilities;
mod field;
mod ops;
mod vector;

pub use capabilities::{MomentumKind, StateCapabilities};
pub use field::{Field, FieldKind, FieldShape, Staggering};
pub use vector::StateVector;
