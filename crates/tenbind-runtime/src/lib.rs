//! # Tenbind Host Runtime
//!
//! An in-process model of the dynamic runtime that native aggregates are
//! cast to and from.
//!
//! ## Overview
//!
//! The runtime is deliberately small. It provides exactly what the casting
//! layer consumes:
//! - Reference-counted host values ([`HostValue`])
//! - A NumPy-like n-dimensional array object with byte strides, a writeable
//!   flag and a base object ([`NdArray`])
//! - Capsules owning native heap allocations ([`Capsule`])
//! - Opaque objects with attributes and native payloads ([`HostObject`])
//!
//! Everything is `Rc`-based and single-threaded: a host value is `!Send`,
//! just like an object of a runtime with a global interpreter lock.
//!
//! ## Module Structure
//!
//! - [`dtype`]: element types and the Rust scalar mapping
//! - [`array`]: the host array object
//! - [`buffer`]: aligned storage owned by arrays
//! - [`capsule`]: owners of native heap allocations
//! - [`object`]: opaque objects
//! - [`value`]: the host value enum
//! - [`error`]: error types

pub mod array;
pub mod buffer;
pub mod capsule;
pub mod dtype;
pub mod error;
pub mod object;
pub mod value;

// Re-export main types for convenience
pub use array::{ArrayOrder, NdArray};
pub use buffer::HostBuffer;
pub use capsule::{capsule_stats, Capsule, CapsuleStats};
pub use dtype::{DType, Element, ScalarValue};
pub use error::{RuntimeError, RuntimeResult};
pub use object::HostObject;
pub use value::HostValue;
