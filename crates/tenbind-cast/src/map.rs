//! Map and Ref Casters
//!
//! Bind views over host arrays without copying. A map binds any array
//! whose dtype, shape and layout already match; it never converts and it
//! requires a writable source. A ref wraps the map caster: a mutable ref
//! behaves exactly like a map, a const ref accepts read-only arrays and
//! may bind to a converted temporary that the cleanup list keeps alive.
//!
//! Only maps export, and only through the `unsafe` [`ToHostRef`]. The
//! exported array aliases the mapped memory, has no owner and is writable;
//! keeping the memory alive is the caller's job.

use tenbind_dense::{DenseBase, Map, Mutability, PlainStorage, Ref, StridePolicy};
use tenbind_runtime::HostValue;
use tenbind_tensor::{
    CastFlags, CleanupList, Contiguity, ExportPolicy, Tensor, TensorCaster, TensorSpec,
};

use crate::caster::{CastName, FromHost, ToHostRef, TypeCaster};
use crate::error::{CastError, CastResult};
use crate::plain::{runtime_shape, tensor_spec, ExportLayout};

/// Tensor requirements for binding a view shaped like `A`
pub fn map_spec<A: PlainStorage, S: StridePolicy>(writable: bool) -> TensorSpec {
    let spec = tensor_spec::<A>().with_writable(writable);
    if S::ANY_STRIDES {
        spec.with_contiguity(Contiguity::Any)
    } else {
        spec
    }
}

/// Element strides `(row_stride, col_stride)` of a view of `tensor`
fn view_strides<A: PlainStorage>(tensor: &Tensor<A::Scalar>) -> (isize, isize) {
    if A::IS_VECTOR {
        if A::ROWS == 1 {
            (0, tensor.stride(0))
        } else {
            (tensor.stride(0), 0)
        }
    } else {
        (tensor.stride(0), tensor.stride(1))
    }
}

/// Binds a [`Map`] over a host array.
///
/// # Aliasing
///
/// Host arrays are shared handles, so the view is bound to `&HostValue`
/// rather than to an exclusive borrow. Loading two writable maps from the
/// same host value, or from two host values sharing one buffer, yields two
/// views that can write the same elements. Callers must not hold element
/// references from one view while writing through the other, nor while the
/// host writes to the array.
#[derive(Debug)]
pub struct MapCaster<'a, A: PlainStorage, S: StridePolicy> {
    caster: TensorCaster<A::Scalar>,
    value: Option<Map<'a, A, S>>,
}

impl<'a, A: PlainStorage, S: StridePolicy> MapCaster<'a, A, S> {
    /// Create a caster; `writable` requires a writable source
    pub fn with_access(writable: bool) -> Self {
        Self {
            caster: TensorCaster::new(map_spec::<A, S>(writable)),
            value: None,
        }
    }

    /// Get the display name of the accepted arrays
    pub fn name(&self) -> String {
        self.caster.name()
    }

    fn is_writable(&self) -> bool {
        self.caster.spec().writable
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> Default for MapCaster<'a, A, S> {
    fn default() -> Self {
        Self::with_access(true)
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> TypeCaster<'a> for MapCaster<'a, A, S> {
    type Value = Map<'a, A, S>;

    fn load(
        &mut self,
        src: &'a HostValue,
        flags: CastFlags,
        cleanup: &'a CleanupList,
    ) -> CastResult<()> {
        self.value = None;
        // Writable views must alias the caller's buffer
        let flags = if self.is_writable() {
            flags.without_convert()
        } else {
            flags
        };
        self.caster.load(src, flags, cleanup)?;
        let tensor = self.caster.take().ok_or(CastError::NotLoaded)?;

        let (rows, cols) = runtime_shape::<A>(&tensor);
        let (row_stride, col_stride) = view_strides::<A>(&tensor);
        // SAFETY: the memory belongs to `src` or to a temporary held by
        // `cleanup`, and both outlive 'a
        let map = unsafe { Map::from_raw_parts(tensor.data(), rows, cols, row_stride, col_stride)? };

        tracing::trace!(rows, cols, row_stride, col_stride, "bound map view");
        self.value = Some(map);
        Ok(())
    }

    fn into_value(self) -> CastResult<Map<'a, A, S>> {
        self.value.ok_or(CastError::NotLoaded)
    }
}

/// Binds a [`Ref`] to a host array
#[derive(Debug)]
pub struct RefCaster<'a, A: PlainStorage, M: Mutability, S: StridePolicy> {
    inner: MapCaster<'a, A, S>,
    value: Option<Ref<'a, A, M, S>>,
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> RefCaster<'a, A, M, S> {
    /// Get the display name of the accepted arrays
    pub fn name(&self) -> String {
        self.inner.name()
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> Default for RefCaster<'a, A, M, S> {
    fn default() -> Self {
        Self {
            inner: MapCaster::with_access(M::MUTABLE),
            value: None,
        }
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> TypeCaster<'a>
    for RefCaster<'a, A, M, S>
{
    type Value = Ref<'a, A, M, S>;

    fn load(
        &mut self,
        src: &'a HostValue,
        flags: CastFlags,
        cleanup: &'a CleanupList,
    ) -> CastResult<()> {
        self.value = None;
        self.inner.load(src, flags, cleanup)?;
        let map = self.inner.value.take().ok_or(CastError::NotLoaded)?;
        self.value = Some(Ref::from_map(map));
        Ok(())
    }

    fn into_value(self) -> CastResult<Ref<'a, A, M, S>> {
        self.value.ok_or(CastError::NotLoaded)
    }
}

/// Export a map as a writable alias with no owner.
///
/// # Safety
///
/// The returned array points into the mapped memory, which must outlive
/// the array and everything derived from it. The host may write through
/// it, so no reference obtained from `map` may be held while it does.
pub unsafe fn export_map<A: PlainStorage, S: StridePolicy>(
    map: &Map<'_, A, S>,
    cleanup: &CleanupList,
) -> HostValue {
    let layout = if A::IS_VECTOR {
        let inner = if map.rows() == 1 {
            map.col_stride()
        } else {
            map.row_stride()
        };
        ExportLayout::vector(map.data_ptr(), map.size(), inner)
    } else {
        ExportLayout::matrix(
            map.data_ptr(),
            [map.rows(), map.cols()],
            [map.row_stride(), map.col_stride()],
        )
    };
    // SAFETY: the caller keeps the mapped memory alive
    let tensor = unsafe { layout.into_tensor(None, false) };
    TensorCaster::to_host(&tensor, ExportPolicy::Reference, cleanup)
}

impl<'a, A: PlainStorage, S: StridePolicy> FromHost<'a> for Map<'a, A, S> {
    type Caster = MapCaster<'a, A, S>;
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> FromHost<'a> for Ref<'a, A, M, S> {
    type Caster = RefCaster<'a, A, M, S>;
}

impl<'a, A: PlainStorage, S: StridePolicy> ToHostRef for Map<'a, A, S> {
    /// Maps always export by reference, whatever the policy
    unsafe fn to_host_ref(&self, _policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        // SAFETY: forwarded from the caller
        unsafe { export_map(self, cleanup) }
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> CastName for Map<'a, A, S> {
    fn cast_name() -> String {
        map_spec::<A, S>(true).name()
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> CastName for Ref<'a, A, M, S> {
    fn cast_name() -> String {
        map_spec::<A, S>(M::MUTABLE).name()
    }
}
