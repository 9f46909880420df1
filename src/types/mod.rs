//! Strongly-typed domain types for safer APIs.
//!
//! This module provides newtypes to make APIs self-documenting and prevent
//! parameter mix-ups between the different integer identities that flow
//! through the minimizer (persisted record numbers vs. tracer slots).
//!
//! All newtypes are `#[repr(transparent)]` and cost nothing at runtime.

mod indices;

pub use indices::{RecordIndex, TracerIndex};
