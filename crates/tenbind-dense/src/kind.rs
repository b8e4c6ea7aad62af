//! Aggregate kind markers.
//!
//! Every dense type names one of four sealed markers as its
//! [`DenseBase::Kind`](crate::DenseBase::Kind). Each marker answers three
//! questions about the type at compile time: does it own its storage, does
//! it map memory it doesn't own, and must it bind to an existing buffer.

mod sealed {
    pub trait Sealed {}
}

/// Compile-time capabilities of an aggregate kind
pub trait Kind: sealed::Sealed + 'static {
    /// Owns and can resize its storage
    const OWNS_STORAGE: bool;
    /// Views memory owned by someone else
    const MAPS_EXTERNAL: bool;
    /// Can only be created over an already existing, compatible buffer
    const BINDS_EXISTING: bool;
}

/// Owning, resizable aggregate (`Matrix`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plain;

/// Lazy computation over other aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression;

/// Non-owning view over caller-supplied memory (`Map`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapView;

/// Non-owning view bound to an existing buffer (`Ref`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefView;

impl sealed::Sealed for Plain {}
impl sealed::Sealed for Expression {}
impl sealed::Sealed for MapView {}
impl sealed::Sealed for RefView {}

impl Kind for Plain {
    const OWNS_STORAGE: bool = true;
    const MAPS_EXTERNAL: bool = false;
    const BINDS_EXISTING: bool = false;
}

impl Kind for Expression {
    const OWNS_STORAGE: bool = false;
    const MAPS_EXTERNAL: bool = false;
    const BINDS_EXISTING: bool = false;
}

impl Kind for MapView {
    const OWNS_STORAGE: bool = false;
    const MAPS_EXTERNAL: bool = true;
    const BINDS_EXISTING: bool = false;
}

// A ref is also a map over external memory
impl Kind for RefView {
    const OWNS_STORAGE: bool = false;
    const MAPS_EXTERNAL: bool = true;
    const BINDS_EXISTING: bool = true;
}
