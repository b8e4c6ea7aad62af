//! The tensor view: a typed, strided pointer plus an owner handle.

use std::marker::PhantomData;

use tenbind_runtime::{Element, HostValue};

/// A rank-1 or rank-2 strided view of `T` elements.
///
/// Strides are in elements, not bytes. For a vector, axis 1 has extent 1
/// and stride 0. The view does not own its memory: `owner`, when present,
/// is the host value keeping it alive.
#[derive(Debug, Clone)]
pub struct Tensor<T> {
    data: *mut T,
    rank: usize,
    shape: [usize; 2],
    strides: [isize; 2],
    owner: Option<HostValue>,
    readonly: bool,
    _marker: PhantomData<T>,
}

impl<T: Element> Tensor<T> {
    /// Create a view over existing memory.
    ///
    /// # Safety
    ///
    /// Every element addressed by `shape` and `strides` (first `rank` axes)
    /// must be valid for reads, and for writes unless the tensor is marked
    /// read-only, for as long as the tensor or anything exported from it is
    /// used. If `owner` is given it must be what keeps the memory alive.
    pub unsafe fn from_raw_parts(
        data: *mut T,
        rank: usize,
        shape: [usize; 2],
        strides: [isize; 2],
        owner: Option<HostValue>,
    ) -> Self {
        debug_assert!(rank == 1 || rank == 2);
        let (shape, strides) = if rank == 1 {
            ([shape[0], 1], [strides[0], 0])
        } else {
            (shape, strides)
        };

        Self {
            data,
            rank,
            shape,
            strides,
            owner,
            readonly: false,
            _marker: PhantomData,
        }
    }

    /// Mark the view read-only
    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    /// Get the number of dimensions
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Get the extent of `axis`
    pub fn shape(&self, axis: usize) -> usize {
        self.shape[axis]
    }

    /// Get the element stride of `axis`
    pub fn stride(&self, axis: usize) -> isize {
        self.strides[axis]
    }

    /// Get the total number of elements
    pub fn size(&self) -> usize {
        self.shape[0] * self.shape[1]
    }

    /// Get the data pointer
    pub fn data(&self) -> *mut T {
        self.data
    }

    /// Get the owner handle
    pub fn owner(&self) -> Option<&HostValue> {
        self.owner.as_ref()
    }

    /// Check if writes through this view are forbidden
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Check if the elements are laid out row-major without gaps
    pub fn is_row_major(&self) -> bool {
        self.rank == 1 && (self.shape[0] <= 1 || self.strides[0] == 1)
            || self.rank == 2
                && (self.shape[1] <= 1 || self.strides[1] == 1)
                && (self.shape[0] <= 1 || self.strides[0] == self.shape[1] as isize)
    }

    /// Check if the elements are laid out column-major without gaps
    pub fn is_col_major(&self) -> bool {
        self.rank == 1 && (self.shape[0] <= 1 || self.strides[0] == 1)
            || self.rank == 2
                && (self.shape[0] <= 1 || self.strides[0] == 1)
                && (self.shape[1] <= 1 || self.strides[1] == self.shape[0] as isize)
    }

    /// Read the element at (`i`, `j`); `j` is ignored for vectors.
    ///
    /// # Safety
    ///
    /// The index must be in bounds.
    pub unsafe fn read(&self, i: usize, j: usize) -> T {
        let offset = i as isize * self.strides[0] + j as isize * self.strides[1];
        self.data.offset(offset).read_unaligned()
    }

    /// Collect the elements in logical row-major order
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.size());
        for i in 0..self.shape[0] {
            for j in 0..self.shape[1] {
                // SAFETY: i and j are within the extents
                out.push(unsafe { self.read(i, j) });
            }
        }
        out
    }
}
