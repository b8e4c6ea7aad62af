//! Host N-Dimensional Arrays
//!
//! [`NdArray`] is the host runtime's array object: a reference-counted
//! handle to a strided block of memory with a dtype, a shape, byte strides,
//! a writeable flag and a base object that keeps the memory alive.
//!
//! ## Memory Layout
//!
//! Strides are in bytes and may be negative. An array is C-contiguous when
//! its strides equal the row-major strides of its shape, and
//! Fortran-contiguous when they equal the column-major ones. Axes of extent
//! one are ignored by both checks and empty arrays are both, matching what
//! NumPy reports in `flags`.
//!
//! ## Ownership
//!
//! An array either owns a [`HostBuffer`], views the data of another host
//! value (its `base`, kept alive for as long as the view exists), or borrows
//! memory whose lifetime is managed by the caller.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Range;
use std::ptr::NonNull;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::buffer::HostBuffer;
use crate::dtype::{read_scalar, write_scalar, DType, Element, ScalarValue};
use crate::error::{RuntimeError, RuntimeResult};
use crate::value::HostValue;

// ============================================================================
// Layout helpers
// ============================================================================

/// Memory layout order for multi-dimensional arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOrder {
    /// C-contiguous (row-major): last dimension varies fastest
    C,
    /// Fortran-contiguous (column-major): first dimension varies fastest
    Fortran,
    /// Neither C nor Fortran contiguous
    Neither,
}

impl ArrayOrder {
    /// Get the NumPy order character
    pub fn as_char(&self) -> char {
        match self {
            ArrayOrder::C => 'C',
            ArrayOrder::Fortran => 'F',
            ArrayOrder::Neither => 'A',
        }
    }
}

/// Row-major byte strides for `shape`
pub fn c_strides(shape: &[usize], itemsize: usize) -> Vec<isize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride = itemsize as isize;

    for &dim in shape.iter().rev() {
        strides.push(stride);
        stride *= dim.max(1) as isize;
    }
    strides.reverse();
    strides
}

/// Column-major byte strides for `shape`
pub fn f_strides(shape: &[usize], itemsize: usize) -> Vec<isize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride = itemsize as isize;

    for &dim in shape {
        strides.push(stride);
        stride *= dim.max(1) as isize;
    }
    strides
}

fn is_contiguous_in<'s>(
    dims: impl Iterator<Item = (&'s usize, &'s isize)>,
    itemsize: usize,
) -> bool {
    let mut expected = itemsize as isize;
    for (&dim, &stride) in dims {
        if dim == 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected *= dim as isize;
    }
    true
}

/// Visit every index of `shape` in row-major order.
fn for_each_index(shape: &[usize], mut f: impl FnMut(&[usize])) {
    if shape.contains(&0) {
        return;
    }

    let mut index = vec![0usize; shape.len()];
    loop {
        f(&index);

        let mut axis = shape.len();
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            index[axis] += 1;
            if index[axis] < shape[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
}

fn byte_offset(strides: &[isize], index: &[usize]) -> isize {
    index
        .iter()
        .zip(strides)
        .map(|(&i, &stride)| i as isize * stride)
        .sum()
}

// ============================================================================
// NdArray
// ============================================================================

static NEXT_ARRAY_ID: AtomicU64 = AtomicU64::new(1);

enum ArrayBase {
    /// The array allocated its own storage
    Owned(HostBuffer),
    /// The data belongs to another host value
    Object(HostValue),
    /// The data is managed outside the host runtime
    Borrowed,
}

struct ArrayInner {
    id: u64,
    data: NonNull<u8>,
    dtype: DType,
    shape: Vec<usize>,
    strides: Vec<isize>,
    base: ArrayBase,
    writeable: Cell<bool>,
    keep_alive: RefCell<Vec<HostValue>>,
}

/// Reference-counted handle to a host array.
///
/// Cloning the handle shares the same array object; use [`NdArray::to_order`]
/// or [`NdArray::astype`] to get an independent copy.
#[derive(Clone)]
pub struct NdArray {
    inner: Rc<ArrayInner>,
}

impl NdArray {
    fn build(
        data: NonNull<u8>,
        dtype: DType,
        shape: Vec<usize>,
        strides: Vec<isize>,
        base: ArrayBase,
        writeable: bool,
    ) -> Self {
        Self {
            inner: Rc::new(ArrayInner {
                id: NEXT_ARRAY_ID.fetch_add(1, Ordering::Relaxed),
                data,
                dtype,
                shape,
                strides,
                base,
                writeable: Cell::new(writeable),
                keep_alive: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Create a new zero-initialized array.
    ///
    /// `ArrayOrder::Neither` allocates in C order.
    pub fn zeros(dtype: DType, shape: &[usize], order: ArrayOrder) -> Self {
        let size: usize = shape.iter().product();
        let buffer = HostBuffer::zeroed(size * dtype.size());
        let strides = match order {
            ArrayOrder::Fortran => f_strides(shape, dtype.size()),
            ArrayOrder::C | ArrayOrder::Neither => c_strides(shape, dtype.size()),
        };

        let data = buffer.as_non_null();
        Self::build(data, dtype, shape.to_vec(), strides, ArrayBase::Owned(buffer), true)
    }

    /// Create a C-ordered array holding `data`
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> RuntimeResult<Self> {
        Self::from_slice(&data, shape)
    }

    /// Create a C-ordered array holding a copy of `data`
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> RuntimeResult<Self> {
        let size: usize = shape.iter().product();
        if size != data.len() {
            return Err(RuntimeError::shape_mismatch(data.len(), shape));
        }

        let array = Self::zeros(T::DTYPE, shape, ArrayOrder::C);
        let dst = array.data_ptr().cast::<T>();
        for (i, &value) in data.iter().enumerate() {
            // SAFETY: the fresh C-ordered buffer holds exactly `size` elements
            unsafe { dst.add(i).write_unaligned(value) }
        }
        Ok(array)
    }

    /// Wrap existing memory as a host array.
    ///
    /// With an `owner` the array keeps that value alive and reports it as its
    /// base; without one the memory is borrowed.
    ///
    /// # Safety
    ///
    /// `data` must be non-null and every element addressed by `shape` and
    /// the byte `strides` must stay readable (and writable, unless the array
    /// is later marked read-only) for as long as the array or any view of it
    /// is alive. Without an owner this is entirely the caller's contract.
    pub unsafe fn from_raw_parts(
        data: *mut u8,
        dtype: DType,
        shape: &[usize],
        strides: &[isize],
        owner: Option<HostValue>,
    ) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        let data = NonNull::new(data).unwrap_or(NonNull::dangling());
        let base = match owner {
            Some(owner) => ArrayBase::Object(owner),
            None => ArrayBase::Borrowed,
        };
        Self::build(data, dtype, shape.to_vec(), strides.to_vec(), base, true)
    }

    /// Get the unique array ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the element dtype
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the number of dimensions
    pub fn ndim(&self) -> usize {
        self.inner.shape.len()
    }

    /// Get the shape
    pub fn shape(&self) -> &[usize] {
        &self.inner.shape
    }

    /// Get the byte strides
    pub fn strides(&self) -> &[isize] {
        &self.inner.strides
    }

    /// Get the total number of elements
    pub fn size(&self) -> usize {
        self.inner.shape.iter().product()
    }

    /// Get the number of bytes covered by the elements
    pub fn nbytes(&self) -> usize {
        self.size() * self.inner.dtype.size()
    }

    /// Get the pointer to the first element
    pub fn data_ptr(&self) -> *mut u8 {
        self.inner.data.as_ptr()
    }

    /// Get the object this array's memory belongs to, if any
    pub fn base(&self) -> Option<HostValue> {
        match &self.inner.base {
            ArrayBase::Object(base) => Some(base.clone()),
            ArrayBase::Owned(_) | ArrayBase::Borrowed => None,
        }
    }

    /// Check if this array allocated its own storage
    pub fn owns_data(&self) -> bool {
        matches!(self.inner.base, ArrayBase::Owned(_))
    }

    /// Check if the layout is C-contiguous
    pub fn is_c_contiguous(&self) -> bool {
        self.size() == 0
            || is_contiguous_in(
                self.inner.shape.iter().zip(&self.inner.strides).rev(),
                self.inner.dtype.size(),
            )
    }

    /// Check if the layout is Fortran-contiguous
    pub fn is_f_contiguous(&self) -> bool {
        self.size() == 0
            || is_contiguous_in(
                self.inner.shape.iter().zip(&self.inner.strides),
                self.inner.dtype.size(),
            )
    }

    /// Get the memory order, preferring C when both apply
    pub fn order(&self) -> ArrayOrder {
        if self.is_c_contiguous() {
            ArrayOrder::C
        } else if self.is_f_contiguous() {
            ArrayOrder::Fortran
        } else {
            ArrayOrder::Neither
        }
    }

    /// Check if writes are allowed
    pub fn is_writeable(&self) -> bool {
        self.inner.writeable.get()
    }

    /// Set the writeable flag
    pub fn set_writeable(&self, writeable: bool) {
        self.inner.writeable.set(writeable);
    }

    fn element_ptr(&self, index: &[usize]) -> RuntimeResult<*mut u8> {
        let shape = &self.inner.shape;
        if index.len() != shape.len() || index.iter().zip(shape).any(|(&i, &dim)| i >= dim) {
            return Err(RuntimeError::index_out_of_bounds(index, shape));
        }
        let offset = byte_offset(&self.inner.strides, index);
        Ok(self.data_ptr().wrapping_offset(offset))
    }

    fn check_dtype<T: Element>(&self) -> RuntimeResult<()> {
        if T::DTYPE != self.inner.dtype {
            return Err(RuntimeError::dtype_mismatch(T::DTYPE, self.inner.dtype));
        }
        Ok(())
    }

    /// Read the element at `index`
    pub fn get<T: Element>(&self, index: &[usize]) -> RuntimeResult<T> {
        self.check_dtype::<T>()?;
        let ptr = self.element_ptr(index)?;
        // SAFETY: index is in bounds and the dtype matches T
        Ok(unsafe { ptr.cast::<T>().read_unaligned() })
    }

    /// Write the element at `index`
    pub fn set<T: Element>(&self, index: &[usize], value: T) -> RuntimeResult<()> {
        if !self.is_writeable() {
            return Err(RuntimeError::ReadOnly);
        }
        self.check_dtype::<T>()?;
        let ptr = self.element_ptr(index)?;
        // SAFETY: index is in bounds, the dtype matches T and the array is writeable
        unsafe { ptr.cast::<T>().write_unaligned(value) }
        Ok(())
    }

    /// Read the element at `index` whatever the dtype
    pub fn get_scalar(&self, index: &[usize]) -> RuntimeResult<ScalarValue> {
        let ptr = self.element_ptr(index)?;
        // SAFETY: index is in bounds
        Ok(unsafe { read_scalar(ptr, self.inner.dtype) })
    }

    /// Collect the elements in logical row-major order
    pub fn to_vec<T: Element>(&self) -> RuntimeResult<Vec<T>> {
        self.check_dtype::<T>()?;
        let mut out = Vec::with_capacity(self.size());
        let base = self.data_ptr();
        for_each_index(&self.inner.shape, |index| {
            let ptr = base.wrapping_offset(byte_offset(&self.inner.strides, index));
            // SAFETY: every visited index is in bounds
            out.push(unsafe { ptr.cast::<T>().read_unaligned() });
        });
        Ok(out)
    }

    fn view(&self, data: *mut u8, shape: Vec<usize>, strides: Vec<isize>) -> Self {
        let data = NonNull::new(data).unwrap_or(self.inner.data);
        Self::build(
            data,
            self.inner.dtype,
            shape,
            strides,
            ArrayBase::Object(HostValue::Array(self.clone())),
            self.is_writeable(),
        )
    }

    /// Reverse the axes, sharing memory with `self`
    pub fn transpose(&self) -> Self {
        let mut shape = self.inner.shape.clone();
        let mut strides = self.inner.strides.clone();
        shape.reverse();
        strides.reverse();
        self.view(self.data_ptr(), shape, strides)
    }

    /// Take `range` along `axis`, sharing memory with `self`
    pub fn slice_axis(&self, axis: usize, range: Range<usize>) -> RuntimeResult<Self> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(RuntimeError::AxisOutOfBounds { axis, ndim });
        }

        let dim = self.inner.shape[axis];
        if range.start > range.end || range.end > dim {
            return Err(RuntimeError::InvalidSlice {
                start: range.start,
                end: range.end,
                dim,
            });
        }

        let mut shape = self.inner.shape.clone();
        shape[axis] = range.end - range.start;
        let offset = range.start as isize * self.inner.strides[axis];
        let data = if shape[axis] == 0 {
            self.data_ptr()
        } else {
            self.data_ptr().wrapping_offset(offset)
        };
        Ok(self.view(data, shape, self.inner.strides.clone()))
    }

    /// Take every `step`-th element along `axis`, sharing memory with `self`
    pub fn step_axis(&self, axis: usize, step: usize) -> RuntimeResult<Self> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(RuntimeError::AxisOutOfBounds { axis, ndim });
        }
        let step = step.max(1);

        let mut shape = self.inner.shape.clone();
        let mut strides = self.inner.strides.clone();
        shape[axis] = shape[axis].div_ceil(step);
        strides[axis] *= step as isize;
        Ok(self.view(self.data_ptr(), shape, strides))
    }

    /// Reverse the element order along `axis`, sharing memory with `self`
    pub fn flip_axis(&self, axis: usize) -> RuntimeResult<Self> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(RuntimeError::AxisOutOfBounds { axis, ndim });
        }

        let dim = self.inner.shape[axis];
        let mut strides = self.inner.strides.clone();
        let data = if dim == 0 {
            self.data_ptr()
        } else {
            self.data_ptr()
                .wrapping_offset((dim - 1) as isize * strides[axis])
        };
        strides[axis] = -strides[axis];
        Ok(self.view(data, self.inner.shape.clone(), strides))
    }

    fn copy_as(&self, dtype: DType, order: ArrayOrder) -> Self {
        let out = Self::zeros(dtype, &self.inner.shape, order);
        let src = self.data_ptr();
        let dst = out.data_ptr();
        let src_dtype = self.inner.dtype;

        for_each_index(&self.inner.shape, |index| {
            let from = src.wrapping_offset(byte_offset(&self.inner.strides, index));
            let to = dst.wrapping_offset(byte_offset(out.strides(), index));
            // SAFETY: both pointers address in-bounds elements of their arrays
            unsafe { write_scalar(to, dtype, read_scalar(from, src_dtype)) }
        });
        out
    }

    fn preferred_order(&self) -> ArrayOrder {
        if !self.is_c_contiguous() && self.is_f_contiguous() {
            ArrayOrder::Fortran
        } else {
            ArrayOrder::C
        }
    }

    /// Return an array with the requested memory order.
    ///
    /// Like `ascontiguousarray` / `asfortranarray`, an array that already
    /// has the requested order is returned as is; `Neither` never copies.
    pub fn to_order(&self, order: ArrayOrder) -> Self {
        self.convert(self.inner.dtype, order)
    }

    /// Copy into a new array of dtype `dtype`, keeping Fortran order for
    /// Fortran-contiguous input and using C order otherwise.
    pub fn astype(&self, dtype: DType) -> Self {
        self.copy_as(dtype, self.preferred_order())
    }

    /// Return an array with dtype `dtype` and memory order `order`, copying
    /// only when `self` doesn't already satisfy both.
    pub fn convert(&self, dtype: DType, order: ArrayOrder) -> Self {
        let layout_ok = match order {
            ArrayOrder::C => self.is_c_contiguous(),
            ArrayOrder::Fortran => self.is_f_contiguous(),
            ArrayOrder::Neither => true,
        };
        if layout_ok && dtype == self.inner.dtype {
            return self.clone();
        }

        let target = match order {
            ArrayOrder::Neither => self.preferred_order(),
            order => order,
        };
        self.copy_as(dtype, target)
    }

    /// Keep `value` alive for as long as this array lives
    pub fn keep_alive(&self, value: HostValue) {
        tracing::trace!(array = self.inner.id, kept = %value.type_name(), "keep alive");
        self.inner.keep_alive.borrow_mut().push(value);
    }

    /// Get the values kept alive by this array
    pub fn kept_alive(&self) -> Vec<HostValue> {
        self.inner.keep_alive.borrow().clone()
    }

    fn byte_extent(&self) -> Option<(usize, usize)> {
        if self.size() == 0 {
            return None;
        }

        let mut low = self.data_ptr() as isize;
        let mut high = low + self.inner.dtype.size() as isize;
        for (&dim, &stride) in self.inner.shape.iter().zip(&self.inner.strides) {
            let span = (dim as isize - 1) * stride;
            if span < 0 {
                low += span;
            } else {
                high += span;
            }
        }
        Some((low as usize, high as usize))
    }

    /// Check if the memory spanned by two arrays overlaps
    pub fn shares_memory(&self, other: &NdArray) -> bool {
        match (self.byte_extent(), other.byte_extent()) {
            (Some((a_low, a_high)), Some((b_low, b_high))) => a_low < b_high && b_low < a_high,
            _ => false,
        }
    }

    /// Get the current reference count
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Check if two handles refer to the same array object
    pub fn ptr_eq(&self, other: &NdArray) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("id", &self.inner.id)
            .field("dtype", &self.inner.dtype)
            .field("shape", &self.inner.shape)
            .field("strides", &self.inner.strides)
            .field("writeable", &self.is_writeable())
            .field("owns_data", &self.owns_data())
            .finish()
    }
}
