//! Plain Aggregate Caster
//!
//! Imports host arrays into owning matrices by copy, and exports owning
//! matrices under the copy, move or reference policy.
//!
//! ## Policy resolution
//!
//! | requested | from `&A` | from `&A`, aliasing | from `A` |
//! |---|---|---|---|
//! | `Automatic` | copy | copy | move |
//! | `AutomaticReference` | copy | reference | move |
//! | `Copy` | copy | copy | copy |
//! | `Move` | move (of a clone) | move (of a clone) | move |
//! | `Reference`, `ReferenceInternal` | copy | reference, read-only | move |
//!
//! The aliasing column is [`ToHostRef`], which is `unsafe` because the
//! exported array doesn't keep the borrow alive.
//!
//! A move of a fixed-size aggregate, or of one smaller than
//! [`MOVE_THRESHOLD_BYTES`], is a copy. Otherwise the value is boxed,
//! the box goes into a capsule and the host array aliases the boxed
//! storage with the capsule as its base.

use std::mem::size_of;
use std::ptr;

use tenbind_dense::{DenseBase, Matrix, PlainStorage, Scalar, StorageOrder, DYN};
use tenbind_runtime::{Capsule, Element, HostValue};
use tenbind_tensor::{
    CastFlags, CleanupList, Contiguity, ExportPolicy, Tensor, TensorCaster, TensorSpec,
};

use crate::caster::{CastName, FromHost, IntoHost, ToHost, ToHostRef, TypeCaster};
use crate::error::{CastError, CastResult};

/// Moves of aggregates smaller than this many bytes are copies
pub const MOVE_THRESHOLD_BYTES: usize = 1024;

fn fixed(extent: usize) -> Option<usize> {
    (extent != DYN).then_some(extent)
}

/// Tensor requirements for importing into a packed `A`.
///
/// Vectors and row-major matrices need C order, column-major matrices
/// Fortran order.
pub fn tensor_spec<A: DenseBase>() -> TensorSpec {
    let dtype = <A::Scalar as Element>::DTYPE;
    let spec = if A::IS_VECTOR {
        let length = if A::ROWS == 1 { A::COLS } else { A::ROWS };
        TensorSpec::new(dtype, 1).with_extent(0, fixed(length))
    } else {
        TensorSpec::new(dtype, 2)
            .with_extent(0, fixed(A::ROWS))
            .with_extent(1, fixed(A::COLS))
    };

    let contiguity = if A::IS_VECTOR || A::ROW_MAJOR {
        Contiguity::RowMajor
    } else {
        Contiguity::ColMajor
    };
    spec.with_contiguity(contiguity)
}

/// Runtime `(rows, cols)` of an `A` loaded from `tensor`
pub(crate) fn runtime_shape<A: DenseBase>(tensor: &Tensor<A::Scalar>) -> (usize, usize) {
    if A::IS_VECTOR {
        if A::ROWS == 1 {
            (1, tensor.shape(0))
        } else {
            (tensor.shape(0), 1)
        }
    } else {
        (tensor.shape(0), tensor.shape(1))
    }
}

/// Where an aggregate's elements are, as the host will see them
pub(crate) struct ExportLayout<T> {
    data: *mut T,
    rank: usize,
    shape: [usize; 2],
    strides: [isize; 2],
}

impl<T: Scalar> ExportLayout<T> {
    /// Layout of the packed storage of `value`
    pub(crate) fn of_plain<A: PlainStorage<Scalar = T>>(value: &A) -> Self {
        let data = value.data().as_ptr().cast_mut();
        if A::IS_VECTOR {
            Self::vector(data, value.size(), value.inner_stride())
        } else {
            Self {
                data,
                rank: 2,
                shape: [value.rows(), value.cols()],
                strides: [value.row_stride(), value.col_stride()],
            }
        }
    }

    pub(crate) fn vector(data: *mut T, size: usize, inner_stride: isize) -> Self {
        Self {
            data,
            rank: 1,
            shape: [size, 1],
            strides: [inner_stride, 0],
        }
    }

    pub(crate) fn matrix(data: *mut T, shape: [usize; 2], strides: [isize; 2]) -> Self {
        Self {
            data,
            rank: 2,
            shape,
            strides,
        }
    }

    /// Build the tensor view.
    ///
    /// # Safety
    ///
    /// The memory must stay valid for as long as the tensor and anything
    /// exported from it are used; `owner`, if given, must be what keeps it
    /// alive.
    pub(crate) unsafe fn into_tensor(self, owner: Option<HostValue>, readonly: bool) -> Tensor<T> {
        Tensor::from_raw_parts(self.data, self.rank, self.shape, self.strides, owner)
            .with_readonly(readonly)
    }
}

fn is_small<A: DenseBase>(value: &A) -> bool {
    A::SIZE_AT_COMPILE_TIME.is_some()
        || value.size() < MOVE_THRESHOLD_BYTES / size_of::<A::Scalar>()
}

fn copy_out<A: PlainStorage>(value: &A, cleanup: &CleanupList) -> HostValue {
    // SAFETY: the tensor only lives for the duration of the copy
    let tensor = unsafe { ExportLayout::of_plain(value).into_tensor(None, true) };
    TensorCaster::to_host(&tensor, ExportPolicy::Copy, cleanup)
}

fn move_out<A: PlainStorage + 'static>(value: A, cleanup: &CleanupList) -> HostValue {
    tracing::debug!(
        rows = value.rows(),
        cols = value.cols(),
        bytes = value.size() * size_of::<A::Scalar>(),
        "moving aggregate into capsule"
    );

    let boxed = Box::new(value);
    let layout = ExportLayout::of_plain(&*boxed);
    let capsule = Capsule::named("tenbind.dense", boxed);
    // SAFETY: the storage lives inside the capsule, which becomes the base
    // of the exported array; moving the box doesn't move its contents
    let tensor = unsafe { layout.into_tensor(Some(HostValue::Capsule(capsule)), false) };
    TensorCaster::to_host(&tensor, ExportPolicy::Move, cleanup)
}

/// Export a shared borrow of a plain aggregate.
///
/// Nothing aliases the borrow: the reference policies copy.
pub fn export_ref<A: PlainStorage + 'static>(
    value: &A,
    policy: ExportPolicy,
    cleanup: &CleanupList,
) -> HostValue {
    match policy {
        ExportPolicy::Move if !is_small(value) => move_out(value.eval(), cleanup),
        _ => copy_out(value, cleanup),
    }
}

/// Export a shared borrow of a plain aggregate, aliasing its storage
/// under the reference policies.
///
/// # Safety
///
/// Under `AutomaticReference`, `Reference` and `ReferenceInternal` the
/// returned array points into `value`. The storage must outlive the array
/// and everything derived from it, and must not be mutated while the host
/// can read it. See [`ToHostRef`].
pub unsafe fn export_ref_aliasing<A: PlainStorage + 'static>(
    value: &A,
    policy: ExportPolicy,
    cleanup: &CleanupList,
) -> HostValue {
    let resolved = match policy {
        ExportPolicy::AutomaticReference | ExportPolicy::Reference => ExportPolicy::Reference,
        ExportPolicy::ReferenceInternal => ExportPolicy::ReferenceInternal,
        _ => return export_ref(value, policy, cleanup),
    };
    // SAFETY: the caller keeps `value` alive and unmodified for as long as
    // the array is used
    let tensor = unsafe { ExportLayout::of_plain(value).into_tensor(None, true) };
    TensorCaster::to_host(&tensor, resolved, cleanup)
}

/// Export a plain aggregate by value
pub fn export_owned<A: PlainStorage + 'static>(
    value: A,
    policy: ExportPolicy,
    cleanup: &CleanupList,
) -> HostValue {
    match policy {
        ExportPolicy::Copy => copy_out(&value, cleanup),
        // Nothing can alias a value that is being consumed
        _ if is_small(&value) => copy_out(&value, cleanup),
        _ => move_out(value, cleanup),
    }
}

/// Imports host arrays into a plain aggregate by copy
#[derive(Debug)]
pub struct PlainCaster<A: PlainStorage> {
    caster: TensorCaster<A::Scalar>,
    value: Option<A>,
}

impl<A: PlainStorage> Default for PlainCaster<A> {
    fn default() -> Self {
        Self {
            caster: TensorCaster::new(tensor_spec::<A>()),
            value: None,
        }
    }
}

impl<A: PlainStorage> PlainCaster<A> {
    /// Get the display name of the accepted arrays
    pub fn name() -> String {
        tensor_spec::<A>().name()
    }
}

impl<'a, A: PlainStorage> TypeCaster<'a> for PlainCaster<A> {
    type Value = A;

    fn load(
        &mut self,
        src: &'a HostValue,
        flags: CastFlags,
        cleanup: &'a CleanupList,
    ) -> CastResult<()> {
        self.value = None;
        self.caster.load(src, flags, cleanup)?;
        let tensor = self.caster.take().ok_or(CastError::NotLoaded)?;

        let (rows, cols) = runtime_shape::<A>(&tensor);
        let mut value = A::try_with_shape(rows, cols)?;
        let dst = value.data_mut();
        debug_assert_eq!(dst.len(), tensor.size());

        // SAFETY: the tensor is packed in A's storage order and holds
        // exactly dst.len() elements
        unsafe {
            ptr::copy_nonoverlapping(
                tensor.data().cast::<u8>().cast_const(),
                dst.as_mut_ptr().cast::<u8>(),
                dst.len() * size_of::<A::Scalar>(),
            );
        }

        self.value = Some(value);
        Ok(())
    }

    fn into_value(self) -> CastResult<A> {
        self.value.ok_or(CastError::NotLoaded)
    }
}

impl<'a, T: Scalar, const R: usize, const C: usize, O: StorageOrder> FromHost<'a>
    for Matrix<T, R, C, O>
{
    type Caster = PlainCaster<Self>;
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> ToHost for Matrix<T, R, C, O> {
    fn to_host(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        export_ref(self, policy, cleanup)
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> ToHostRef for Matrix<T, R, C, O> {
    unsafe fn to_host_ref(&self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        // SAFETY: forwarded from the caller
        unsafe { export_ref_aliasing(self, policy, cleanup) }
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> IntoHost for Matrix<T, R, C, O> {
    fn into_host(self, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        export_owned(self, policy, cleanup)
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> CastName for Matrix<T, R, C, O> {
    fn cast_name() -> String {
        PlainCaster::<Self>::name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenbind_dense::{Matrix4, MatrixX, MatrixXR, RowVectorX, Vector3, VectorX};
    use tenbind_runtime::{capsule_stats, NdArray};

    #[test]
    fn test_names() {
        insta::assert_snapshot!(
            Vector3::<i32>::cast_name(),
            @"numpy.ndarray[dtype=int32, shape=(3), order='C']"
        );
        insta::assert_snapshot!(
            MatrixX::<u32>::cast_name(),
            @"numpy.ndarray[dtype=uint32, shape=(*, *), order='F']"
        );
        insta::assert_snapshot!(
            Matrix4::<f64>::cast_name(),
            @"numpy.ndarray[dtype=float64, shape=(4, 4), order='F']"
        );
        insta::assert_snapshot!(
            RowVectorX::<f32>::cast_name(),
            @"numpy.ndarray[dtype=float32, shape=(*), order='C']"
        );
    }

    #[test]
    fn test_move_threshold() {
        let small = VectorX::<f64>::zeros(127, 1).unwrap();
        let large = VectorX::<f64>::zeros(128, 1).unwrap();
        assert!(is_small(&small));
        assert!(!is_small(&large));

        let fixed = Matrix4::<f64>::default();
        assert!(is_small(&fixed));
    }

    #[test]
    fn test_import_copies() {
        let array = NdArray::from_vec(vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let src = HostValue::Array(array.clone());
        let cleanup = CleanupList::new();

        let mut caster = PlainCaster::<MatrixXR<f64>>::default();
        caster.load(&src, CastFlags::NONE, &cleanup).unwrap();
        let m = caster.into_value().unwrap();

        array.set::<f64>(&[0, 0], 100.0).unwrap();
        assert_eq!(m.to_row_major_vec(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(cleanup.is_empty());
    }

    #[test]
    fn test_reference_policies_copy_from_safe_export() {
        let m = MatrixX::<u64>::from_fn(64, 64, |_, _| 0xAAAA_AAAA_AAAA_AAAA);
        let cleanup = CleanupList::new();

        let exported: Vec<HostValue> = [
            ExportPolicy::AutomaticReference,
            ExportPolicy::Reference,
            ExportPolicy::ReferenceInternal,
        ]
        .into_iter()
        .map(|policy| m.to_host(policy, &cleanup))
        .collect();
        drop(m);

        let scratch: Vec<Vec<u64>> = (0..16).map(|i| vec![i; 4096]).collect();
        for out in &exported {
            let array = out.as_array().unwrap();
            assert!(array.owns_data());
            assert_eq!(array.get::<u64>(&[0, 0]).unwrap(), 0xAAAA_AAAA_AAAA_AAAA);
            assert_eq!(array.get::<u64>(&[63, 63]).unwrap(), 0xAAAA_AAAA_AAAA_AAAA);
        }
        assert_eq!(scratch.len(), 16);
    }

    #[test]
    fn test_export_ref_is_read_only_alias() {
        let m = MatrixX::<i32>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        let cleanup = CleanupList::new();

        // SAFETY: `m` outlives `out` and isn't written to
        let out = unsafe { m.to_host_ref(ExportPolicy::Reference, &cleanup) };
        let array = out.as_array().unwrap();
        assert_eq!(array.data_ptr(), m.as_slice().as_ptr().cast::<u8>().cast_mut());
        assert!(!array.is_writeable());
        assert!(array.is_f_contiguous());
        assert_eq!(array.to_vec::<i32>().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_export_owned_large_moves_into_capsule() {
        let before = capsule_stats();
        let cleanup = CleanupList::new();
        let v = VectorX::<u8>::from_vector_slice(&[7u8; 2048]).unwrap();
        let ptr = v.as_slice().as_ptr();

        let out = v.into_host(ExportPolicy::Automatic, &cleanup);
        let array = out.as_array().unwrap();
        assert_eq!(array.data_ptr().cast_const(), ptr);
        assert!(matches!(array.base(), Some(HostValue::Capsule(_))));
        assert_eq!(capsule_stats().since(before).created, 1);

        drop(out);
        assert_eq!(capsule_stats().since(before).released, 1);
    }
}
