//! # Tenbind Tensor Views
//!
//! The tensor view primitive every numeric caster is built on: a typed,
//! strided view of a host array ([`Tensor`]), the requirements a native type
//! places on that array ([`TensorSpec`]), and the caster that validates and
//! converts host values on import and builds host arrays on export
//! ([`TensorCaster`]).
//!
//! ## Module Structure
//!
//! - [`spec`]: rank, extents, memory order and writability requirements
//! - [`tensor`]: the view itself
//! - [`caster`]: import validation and export policies
//! - [`policy`]: cast flags, export policies and the per-call cleanup list
//! - [`error`]: import rejections

pub mod caster;
pub mod error;
pub mod policy;
pub mod spec;
pub mod tensor;

// Re-export main types for convenience
pub use caster::TensorCaster;
pub use error::{LoadResult, Rejection};
pub use policy::{CastFlags, CleanupList, ExportPolicy};
pub use spec::{Contiguity, TensorSpec};
pub use tensor::Tensor;
