//! The caster contract.
//!
//! A native type that can be imported names its caster through
//! [`FromHost`]; the caster is created fresh for every attempt, loads one
//! host value and is consumed by [`TypeCaster::into_value`]. Export goes
//! through [`ToHost`] (from a shared borrow) or [`IntoHost`] (by value) and
//! cannot fail. Neither hands the host a pointer into native storage it
//! doesn't own; exports that alias a borrow go through the `unsafe`
//! [`ToHostRef`].
//!
//! The lifetime `'a` ties an imported value to the host value and cleanup
//! list it was loaded from. Types that own their data implement
//! `FromHost<'a>` for every `'a`; views implement it only for the lifetime
//! of the buffer they borrow.

use tenbind_runtime::HostValue;
use tenbind_tensor::{CastFlags, CleanupList, ExportPolicy};

use crate::error::CastResult;

/// Loads one host value as a native value
pub trait TypeCaster<'a>: Default {
    /// The native type produced
    type Value;

    /// Try to bind `src`; temporaries created on the way are kept in
    /// `cleanup`
    fn load(
        &mut self,
        src: &'a HostValue,
        flags: CastFlags,
        cleanup: &'a CleanupList,
    ) -> CastResult<()>;

    /// Take the loaded value
    fn into_value(self) -> CastResult<Self::Value>;
}

/// Native types that can be imported from the host
pub trait FromHost<'a>: Sized {
    /// The caster that imports this type
    type Caster: TypeCaster<'a, Value = Self>;
}

/// Canonical display name of a native type as the host sees it
pub trait CastName {
    /// Get the display name
    fn cast_name() -> String;
}

/// Export from a shared borrow
pub trait ToHost {
    /// Hand `self` to the host under `policy`
    fn to_host(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue;
}

/// Export that aliases the storage of a shared borrow.
///
/// The host value returned by [`ToHostRef::to_host_ref`] points into the
/// storage behind `&self` without owning it, so the borrow checker can't
/// see how long it is used.
pub trait ToHostRef {
    /// Hand a view of `self` to the host under `policy`.
    ///
    /// # Safety
    ///
    /// The storage behind `self` must stay allocated, and must not be
    /// written through any other path, for as long as the returned value
    /// or any array derived from it is used. Under `ReferenceInternal`
    /// with a parent on `cleanup`, keeping the parent alive must keep the
    /// storage alive.
    unsafe fn to_host_ref(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue;
}

/// Export by value
pub trait IntoHost {
    /// Hand `self` to the host under `policy`
    fn into_host(self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue;
}

/// Import `src` as a `T`
pub fn load<'a, T: FromHost<'a>>(
    src: &'a HostValue,
    flags: CastFlags,
    cleanup: &'a CleanupList,
) -> CastResult<T> {
    let mut caster = T::Caster::default();
    caster.load(src, flags, cleanup)?;
    caster.into_value()
}

/// Import `src` as a `T` that owns its data, with conversion allowed.
///
/// Views can't be returned from here: they would outlive the temporary
/// cleanup list.
pub fn cast<T>(src: &HostValue) -> CastResult<T>
where
    T: for<'a> FromHost<'a>,
{
    let cleanup = CleanupList::new();
    load::<T>(src, CastFlags::CONVERT, &cleanup)
}

/// Export `value` under `policy` outside of any call
pub fn to_host<T: IntoHost>(value: T, policy: ExportPolicy) -> HostValue {
    let cleanup = CleanupList::new();
    value.into_host(policy, &cleanup)
}
