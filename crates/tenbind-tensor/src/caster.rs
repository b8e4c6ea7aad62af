//! Tensor Caster
//!
//! Validates a host value against a [`TensorSpec`] and produces a
//! [`Tensor`] view of it, and turns tensors back into host arrays.
//!
//! ## Import
//!
//! Rank and fixed extents must match exactly; they are never converted.
//! A dtype or memory-order mismatch is repaired with a converted host
//! temporary, but only when [`CastFlags::convert`] is set and the spec
//! does not ask for a writeable view (writes would land in the temporary).
//! The temporary is pushed to the [`CleanupList`] so it lives until the
//! call returns.
//!
//! ## Export
//!
//! | policy | result |
//! |---|---|
//! | `Copy` | new host array, Fortran order if the tensor is column-major |
//! | `Reference`, `AutomaticReference` | alias with the tensor's owner |
//! | `ReferenceInternal` | alias owned by the tensor's owner, else the call's parent |
//! | `Automatic`, `Move` | alias if the tensor has an owner, copy otherwise |

use tenbind_runtime::{ArrayOrder, Element, HostValue, NdArray};

use crate::error::{LoadResult, Rejection};
use crate::policy::{CastFlags, CleanupList, ExportPolicy};
use crate::spec::{Contiguity, TensorSpec};
use crate::tensor::Tensor;

/// Loads host arrays as `Tensor<T>` views
#[derive(Debug)]
pub struct TensorCaster<T: Element> {
    spec: TensorSpec,
    value: Option<Tensor<T>>,
}

impl<T: Element> TensorCaster<T> {
    /// Create a caster for `spec`; the dtype always comes from `T`
    pub fn new(spec: TensorSpec) -> Self {
        Self {
            spec: TensorSpec {
                dtype: T::DTYPE,
                ..spec
            },
            value: None,
        }
    }

    /// Get the spec this caster validates against
    pub fn spec(&self) -> &TensorSpec {
        &self.spec
    }

    /// Get the display name of the accepted arrays
    pub fn name(&self) -> String {
        self.spec.name()
    }

    /// Get the loaded tensor
    pub fn value(&self) -> Option<&Tensor<T>> {
        self.value.as_ref()
    }

    /// Take the loaded tensor out of the caster
    pub fn take(&mut self) -> Option<Tensor<T>> {
        self.value.take()
    }

    fn layout_matches(&self, array: &NdArray) -> bool {
        match self.spec.contiguity {
            Contiguity::RowMajor => array.is_c_contiguous(),
            Contiguity::ColMajor => array.is_f_contiguous(),
            Contiguity::Any => {
                let itemsize = T::DTYPE.size() as isize;
                array.strides().iter().all(|stride| stride % itemsize == 0)
            }
        }
    }

    /// Try to bind `src`.
    ///
    /// On success the tensor is available through [`TensorCaster::value`].
    /// Its owner is the host array the data belongs to: `src` itself, or
    /// the converted temporary held by `cleanup`.
    pub fn load(
        &mut self,
        src: &HostValue,
        flags: CastFlags,
        cleanup: &CleanupList,
    ) -> LoadResult<()> {
        self.value = None;

        let array = src
            .as_array()
            .ok_or_else(|| Rejection::not_an_array(src.type_name()))?;

        if array.ndim() != self.spec.rank {
            return Err(Rejection::RankMismatch {
                expected: self.spec.rank,
                actual: array.ndim(),
            });
        }

        for (axis, extent) in self.spec.extents[..self.spec.rank].iter().enumerate() {
            match *extent {
                Some(expected) if array.shape()[axis] != expected => {
                    return Err(Rejection::ExtentMismatch {
                        axis,
                        expected,
                        actual: array.shape()[axis],
                    });
                }
                _ => {}
            }
        }

        if self.spec.writable && !array.is_writeable() {
            return Err(Rejection::ReadOnly);
        }

        let dtype_ok = array.dtype() == T::DTYPE;
        let layout_ok = self.layout_matches(array);

        let array = if dtype_ok && layout_ok {
            array.clone()
        } else {
            let rejection = if !dtype_ok {
                Rejection::DTypeMismatch {
                    expected: T::DTYPE,
                    actual: array.dtype(),
                }
            } else {
                Rejection::Layout {
                    required: self.spec.contiguity,
                }
            };

            if !flags.convert || self.spec.writable {
                tracing::trace!(spec = %self.spec, %rejection, "tensor import rejected");
                return Err(rejection);
            }

            let order = match self.spec.contiguity {
                Contiguity::Any if !layout_ok => ArrayOrder::C,
                contiguity => contiguity.array_order(),
            };
            let converted = array.convert(T::DTYPE, order);
            tracing::debug!(
                from = %array.dtype(),
                to = %T::DTYPE,
                order = %order.as_char(),
                "converted host array for import"
            );
            cleanup.keep(HostValue::Array(converted.clone()));
            converted
        };

        self.value = Some(self.view_of(array));
        Ok(())
    }

    fn view_of(&self, array: NdArray) -> Tensor<T> {
        let itemsize = T::DTYPE.size() as isize;
        let rank = self.spec.rank;

        let mut shape = [1usize; 2];
        shape[..rank].copy_from_slice(array.shape());

        let mut strides = [0isize; 2];
        match self.spec.contiguity {
            // Extent-1 axes may carry arbitrary strides, so use canonical ones
            Contiguity::RowMajor => {
                strides[rank - 1] = 1;
                if rank == 2 {
                    strides[0] = shape[1] as isize;
                }
            }
            Contiguity::ColMajor => {
                strides[0] = 1;
                if rank == 2 {
                    strides[1] = shape[0] as isize;
                }
            }
            Contiguity::Any => {
                for (out, stride) in strides.iter_mut().zip(array.strides()) {
                    *out = stride / itemsize;
                }
            }
        }

        let readonly = !array.is_writeable();
        let data = array.data_ptr().cast::<T>();
        // SAFETY: the view covers exactly the array's elements and the array
        // itself is the owner
        unsafe {
            Tensor::from_raw_parts(data, rank, shape, strides, Some(HostValue::Array(array)))
                .with_readonly(readonly)
        }
    }

    /// Export `tensor` to the host under `policy`
    pub fn to_host(tensor: &Tensor<T>, policy: ExportPolicy, cleanup: &CleanupList) -> HostValue {
        let owner = match policy {
            ExportPolicy::Copy => None,
            ExportPolicy::Reference | ExportPolicy::AutomaticReference => {
                return HostValue::Array(Self::alias(tensor, tensor.owner().cloned()));
            }
            ExportPolicy::ReferenceInternal => {
                let owner = tensor.owner().or_else(|| cleanup.parent()).cloned();
                return HostValue::Array(Self::alias(tensor, owner));
            }
            ExportPolicy::Automatic | ExportPolicy::Move => tensor.owner().cloned(),
        };

        match owner {
            Some(owner) => HostValue::Array(Self::alias(tensor, Some(owner))),
            None => HostValue::Array(Self::copy(tensor)),
        }
    }

    fn alias(tensor: &Tensor<T>, owner: Option<HostValue>) -> NdArray {
        let itemsize = T::DTYPE.size() as isize;
        let rank = tensor.rank();
        let shape: Vec<usize> = (0..rank).map(|axis| tensor.shape(axis)).collect();
        let strides: Vec<isize> = (0..rank).map(|axis| tensor.stride(axis) * itemsize).collect();

        // SAFETY: the tensor's own contract covers these elements; `owner`
        // is either the tensor's owner or an object outliving it
        let array = unsafe {
            NdArray::from_raw_parts(
                tensor.data().cast::<u8>(),
                T::DTYPE,
                &shape,
                &strides,
                owner,
            )
        };
        array.set_writeable(!tensor.is_readonly());
        array
    }

    fn copy(tensor: &Tensor<T>) -> NdArray {
        tracing::trace!(dtype = %T::DTYPE, elements = tensor.size(), "copying tensor to host");
        Self::alias(tensor, None).astype(T::DTYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenbind_runtime::DType;

    fn matrix_f64(rows: usize, cols: usize) -> NdArray {
        let data: Vec<f64> = (0..rows * cols).map(|v| v as f64).collect();
        NdArray::from_vec(data, &[rows, cols]).unwrap()
    }

    #[test]
    fn test_load_exact_match() {
        let array = matrix_f64(2, 3);
        let src = HostValue::Array(array.clone());
        let cleanup = CleanupList::new();

        let mut caster = TensorCaster::<f64>::new(
            TensorSpec::new(DType::Float64, 2).with_contiguity(Contiguity::RowMajor),
        );
        caster.load(&src, CastFlags::NONE, &cleanup).unwrap();

        let tensor = caster.value().unwrap();
        assert_eq!(tensor.shape(0), 2);
        assert_eq!(tensor.shape(1), 3);
        assert_eq!(tensor.stride(0), 3);
        assert_eq!(tensor.data().cast::<u8>(), array.data_ptr());
        assert!(cleanup.is_empty());
        assert!(matches!(tensor.owner(), Some(HostValue::Array(owner)) if owner.ptr_eq(&array)));
    }

    #[test]
    fn test_load_rejects_non_arrays() {
        let cleanup = CleanupList::new();
        let mut caster = TensorCaster::<i32>::new(TensorSpec::new(DType::Int32, 1));

        for src in [HostValue::Int(3), HostValue::from("abc"), HostValue::None] {
            let err = caster.load(&src, CastFlags::CONVERT, &cleanup).unwrap_err();
            assert!(matches!(err, Rejection::NotAnArray { .. }));
        }
    }

    #[test]
    fn test_load_shape_checks() {
        let src = HostValue::Array(matrix_f64(2, 3));
        let cleanup = CleanupList::new();

        let mut vector = TensorCaster::<f64>::new(TensorSpec::new(DType::Float64, 1));
        assert_eq!(
            vector.load(&src, CastFlags::CONVERT, &cleanup),
            Err(Rejection::RankMismatch {
                expected: 1,
                actual: 2
            })
        );

        let mut fixed =
            TensorCaster::<f64>::new(TensorSpec::new(DType::Float64, 2).with_extent(0, Some(3)));
        assert_eq!(
            fixed.load(&src, CastFlags::CONVERT, &cleanup),
            Err(Rejection::ExtentMismatch {
                axis: 0,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_dtype_conversion_needs_flag() {
        let src = HostValue::Array(NdArray::from_vec(vec![1u32, 2, 3], &[3]).unwrap());
        let cleanup = CleanupList::new();
        let mut caster = TensorCaster::<i32>::new(TensorSpec::new(DType::Int32, 1));

        assert_eq!(
            caster.load(&src, CastFlags::NONE, &cleanup),
            Err(Rejection::DTypeMismatch {
                expected: DType::Int32,
                actual: DType::UInt32
            })
        );

        caster.load(&src, CastFlags::CONVERT, &cleanup).unwrap();
        assert_eq!(caster.value().unwrap().to_vec(), vec![1, 2, 3]);
        assert_eq!(cleanup.len(), 1);
    }

    #[test]
    fn test_layout_conversion() {
        let src = HostValue::Array(matrix_f64(2, 3));
        let cleanup = CleanupList::new();
        let spec = TensorSpec::new(DType::Float64, 2).with_contiguity(Contiguity::ColMajor);

        let mut caster = TensorCaster::<f64>::new(spec);
        assert_eq!(
            caster.load(&src, CastFlags::NONE, &cleanup),
            Err(Rejection::Layout {
                required: Contiguity::ColMajor
            })
        );

        caster.load(&src, CastFlags::CONVERT, &cleanup).unwrap();
        let tensor = caster.value().unwrap();
        assert!(tensor.is_col_major());
        assert_eq!(tensor.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_writable_spec_never_converts() {
        let array = matrix_f64(2, 2);
        let cleanup = CleanupList::new();
        let spec = TensorSpec::new(DType::Float32, 2).with_writable(true);
        let mut caster = TensorCaster::<f32>::new(spec);

        let err = caster
            .load(&HostValue::Array(array.clone()), CastFlags::CONVERT, &cleanup)
            .unwrap_err();
        assert!(err.is_convertible());

        array.set_writeable(false);
        let mut same_dtype = TensorCaster::<f64>::new(spec);
        assert_eq!(
            same_dtype.load(&HostValue::Array(array), CastFlags::CONVERT, &cleanup),
            Err(Rejection::ReadOnly)
        );
    }

    #[test]
    fn test_strided_view_keeps_strides() {
        let array = matrix_f64(4, 4).step_axis(0, 2).unwrap();
        let cleanup = CleanupList::new();
        let mut caster = TensorCaster::<f64>::new(TensorSpec::new(DType::Float64, 2));
        caster.load(&HostValue::Array(array), CastFlags::NONE, &cleanup).unwrap();

        let tensor = caster.value().unwrap();
        assert_eq!((tensor.stride(0), tensor.stride(1)), (8, 1));
        assert_eq!(tensor.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_to_host_copy_and_reference() {
        let mut data = vec![1.0f64, 2.0, 3.0, 4.0];
        let tensor = unsafe { Tensor::from_raw_parts(data.as_mut_ptr(), 2, [2, 2], [1, 2], None) };
        let cleanup = CleanupList::new();

        let copied = TensorCaster::to_host(&tensor, ExportPolicy::Copy, &cleanup);
        let copied = copied.as_array().unwrap();
        assert!(copied.is_f_contiguous());
        assert!(copied.owns_data());
        assert_eq!(copied.to_vec::<f64>().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);

        let aliased = TensorCaster::to_host(&tensor, ExportPolicy::Reference, &cleanup);
        let aliased = aliased.as_array().unwrap();
        assert_eq!(aliased.data_ptr(), data.as_mut_ptr().cast::<u8>());
        assert!(aliased.base().is_none());
        assert_eq!(aliased.strides(), &[8, 16]);
    }

    #[test]
    fn test_to_host_reference_internal_uses_parent() {
        let mut data = [5i32; 3];
        let tensor = unsafe { Tensor::from_raw_parts(data.as_mut_ptr(), 1, [3, 1], [1, 0], None) }
            .with_readonly(true);
        let parent = matrix_f64(1, 1);
        let cleanup = CleanupList::with_parent(HostValue::Array(parent.clone()));

        let out = TensorCaster::to_host(&tensor, ExportPolicy::ReferenceInternal, &cleanup);
        let out = out.as_array().unwrap();
        assert!(!out.is_writeable());
        assert!(matches!(out.base(), Some(HostValue::Array(base)) if base.ptr_eq(&parent)));
    }
}
