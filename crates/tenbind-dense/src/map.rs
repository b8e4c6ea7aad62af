//! Map and Ref Views
//!
//! Non-owning views over memory that belongs to someone else.
//!
//! A [`Map`] is built directly over a pointer, an extent pair and a stride
//! pair. With the [`Contiguous`] policy the strides must describe packed
//! storage in the plain type's order; with [`Strided`] any strides
//! (including negative ones) are accepted.
//!
//! A [`Ref`] wraps a map and can only be obtained by binding to an
//! existing buffer. A `Ref<_, Mut>` writes through; a `Ref<_, Const>` only
//! reads.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};

use crate::base::{check_extent, packed_strides, DenseBase, PlainStorage, StorageOrder};
use crate::error::{DenseError, DenseResult};
use crate::kind::{MapView, RefView};

mod sealed {
    pub trait Sealed {}
}

// ============================================================================
// Policies
// ============================================================================

/// Which strides a map accepts
pub trait StridePolicy: sealed::Sealed + 'static {
    /// Arbitrary strides are accepted
    const ANY_STRIDES: bool;
}

/// Packed storage in the plain type's order
#[derive(Debug, Clone, Copy, Default)]
pub struct Contiguous;

/// Any strides
#[derive(Debug, Clone, Copy, Default)]
pub struct Strided;

impl sealed::Sealed for Contiguous {}
impl sealed::Sealed for Strided {}

impl StridePolicy for Contiguous {
    const ANY_STRIDES: bool = false;
}

impl StridePolicy for Strided {
    const ANY_STRIDES: bool = true;
}

/// Whether a ref writes through to the bound buffer
pub trait Mutability: sealed::Sealed + 'static {
    /// Writes are allowed
    const MUTABLE: bool;
}

/// Read-write ref
#[derive(Debug, Clone, Copy, Default)]
pub struct Mut;

/// Read-only ref
#[derive(Debug, Clone, Copy, Default)]
pub struct Const;

impl sealed::Sealed for Mut {}
impl sealed::Sealed for Const {}

impl Mutability for Mut {
    const MUTABLE: bool = true;
}

impl Mutability for Const {
    const MUTABLE: bool = false;
}

// ============================================================================
// Map
// ============================================================================

/// A view of external memory shaped like the plain type `A`.
pub struct Map<'a, A: PlainStorage, S: StridePolicy = Contiguous> {
    data: *mut A::Scalar,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    _marker: PhantomData<(&'a mut [A::Scalar], S)>,
}

impl<'a, A: PlainStorage, S: StridePolicy> Map<'a, A, S> {
    /// Check that a shape and stride pair is acceptable for this map type
    pub fn validate(rows: usize, cols: usize, row_stride: isize, col_stride: isize) -> DenseResult<()> {
        check_extent("rows", A::ROWS, rows)?;
        check_extent("cols", A::COLS, cols)?;

        if S::ANY_STRIDES {
            return Ok(());
        }

        // Strides of extent-1 axes are never used
        let (expected_row, expected_col) = packed_strides::<A::Order>(rows, cols);
        let rows_ok = rows <= 1 || row_stride == expected_row;
        let cols_ok = cols <= 1 || col_stride == expected_col;
        if rows_ok && cols_ok {
            Ok(())
        } else {
            Err(DenseError::Strides {
                row_stride,
                col_stride,
                rows,
                cols,
                order: <A::Order as StorageOrder>::NAME,
            })
        }
    }

    /// Create a map over raw memory.
    ///
    /// # Safety
    ///
    /// Every element addressed by the extents and element strides must be
    /// valid for reads and writes for `'a`, and must not be accessed through
    /// any other reference while the map is used.
    pub unsafe fn from_raw_parts(
        data: *mut A::Scalar,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> DenseResult<Self> {
        Self::validate(rows, cols, row_stride, col_stride)?;
        Ok(Self::from_parts_unchecked(data, rows, cols, row_stride, col_stride))
    }

    pub(crate) unsafe fn from_parts_unchecked(
        data: *mut A::Scalar,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            data,
            rows,
            cols,
            row_stride,
            col_stride,
            _marker: PhantomData,
        }
    }

    /// Get the data pointer
    pub fn data_ptr(&self) -> *mut A::Scalar {
        self.data
    }

    /// Element step between consecutive rows
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    /// Element step between consecutive columns
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    fn element(&self, i: usize, j: usize) -> *mut A::Scalar {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for a {}x{} map",
            i,
            j,
            self.rows,
            self.cols
        );
        let offset = i as isize * self.row_stride + j as isize * self.col_stride;
        self.data.wrapping_offset(offset)
    }

    fn linear(&self, index: usize) -> (usize, usize) {
        if self.rows == 1 {
            (0, index)
        } else if self.cols == 1 {
            (index, 0)
        } else if A::ROW_MAJOR {
            (index / self.cols.max(1), index % self.cols.max(1))
        } else {
            (index % self.rows.max(1), index / self.rows.max(1))
        }
    }

    /// Write the element at `(i, j)`
    pub fn set_coeff(&mut self, i: usize, j: usize, value: A::Scalar) {
        let ptr = self.element(i, j);
        // SAFETY: bounds checked; validity is the constructor's contract
        unsafe { ptr.write_unaligned(value) }
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: A::Scalar) {
        for i in 0..self.rows {
            for j in 0..self.cols {
                self.set_coeff(i, j, value);
            }
        }
    }

    /// Copy every element of `src` into the mapped memory.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn assign<E: DenseBase<Scalar = A::Scalar>>(&mut self, src: &E) {
        assert!(
            src.rows() == self.rows && src.cols() == self.cols,
            "shape mismatch in assignment: {}x{} into {}x{}",
            src.rows(),
            src.cols(),
            self.rows,
            self.cols
        );
        for i in 0..self.rows {
            for j in 0..self.cols {
                self.set_coeff(i, j, src.coeff(i, j));
            }
        }
    }
}

impl<'a, A: PlainStorage> Map<'a, A, Contiguous> {
    /// Map a mutable slice holding packed storage in `A`'s order
    pub fn from_slice_mut(data: &'a mut [A::Scalar], rows: usize, cols: usize) -> DenseResult<Self> {
        if data.len() != rows * cols {
            return Err(DenseError::DataLength {
                len: data.len(),
                rows,
                cols,
            });
        }
        let (row_stride, col_stride) = packed_strides::<A::Order>(rows, cols);
        // SAFETY: the slice is exclusively borrowed for 'a and holds exactly
        // the packed elements
        unsafe { Self::from_raw_parts(data.as_mut_ptr(), rows, cols, row_stride, col_stride) }
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> DenseBase for Map<'a, A, S> {
    type Scalar = A::Scalar;
    type Kind = MapView;
    type Order = A::Order;
    type PlainObject = A;

    const ROWS: usize = A::ROWS;
    const COLS: usize = A::COLS;

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn coeff(&self, i: usize, j: usize) -> A::Scalar {
        // SAFETY: bounds checked; validity is the constructor's contract
        unsafe { self.element(i, j).read_unaligned() }
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> Index<(usize, usize)> for Map<'a, A, S> {
    type Output = A::Scalar;

    fn index(&self, (i, j): (usize, usize)) -> &A::Scalar {
        // SAFETY: bounds checked; element pointers of host buffers are
        // aligned for the dtype
        unsafe { &*self.element(i, j) }
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> IndexMut<(usize, usize)> for Map<'a, A, S> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut A::Scalar {
        // SAFETY: as for `index`, and the map is borrowed mutably
        unsafe { &mut *self.element(i, j) }
    }
}

/// Logical index for vectors, storage-order index otherwise
impl<'a, A: PlainStorage, S: StridePolicy> Index<usize> for Map<'a, A, S> {
    type Output = A::Scalar;

    fn index(&self, index: usize) -> &A::Scalar {
        let (i, j) = self.linear(index);
        &self[(i, j)]
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> IndexMut<usize> for Map<'a, A, S> {
    fn index_mut(&mut self, index: usize) -> &mut A::Scalar {
        let (i, j) = self.linear(index);
        &mut self[(i, j)]
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> fmt::Debug for Map<'a, A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("row_stride", &self.row_stride)
            .field("col_stride", &self.col_stride)
            .field("values", &self.to_row_major_vec())
            .finish()
    }
}

// ============================================================================
// Ref
// ============================================================================

/// A map that was bound to an existing buffer.
pub struct Ref<'a, A: PlainStorage, M: Mutability = Mut, S: StridePolicy = Contiguous> {
    map: Map<'a, A, S>,
    _mutability: PhantomData<M>,
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> Ref<'a, A, M, S> {
    /// Bind to the memory of `map`
    pub fn from_map(map: Map<'a, A, S>) -> Self {
        Self {
            map,
            _mutability: PhantomData,
        }
    }
}

impl<'a, A: PlainStorage> Ref<'a, A, Mut, Contiguous> {
    /// Bind to the storage of a plain aggregate
    pub fn from_plain(plain: &'a mut A) -> Self {
        let (rows, cols) = (plain.rows(), plain.cols());
        let (row_stride, col_stride) = (plain.row_stride(), plain.col_stride());
        let data = plain.data_mut().as_mut_ptr();
        // SAFETY: packed storage, exclusively borrowed for 'a
        let map = unsafe { Map::from_parts_unchecked(data, rows, cols, row_stride, col_stride) };
        Self::from_map(map)
    }
}

impl<'a, A: PlainStorage> Ref<'a, A, Const, Contiguous> {
    /// Bind read-only to the storage of a plain aggregate
    pub fn from_plain_ref(plain: &'a A) -> Self {
        let (rows, cols) = (plain.rows(), plain.cols());
        let (row_stride, col_stride) = (plain.row_stride(), plain.col_stride());
        let data = plain.data().as_ptr().cast_mut();
        // SAFETY: a const ref never hands out mutable access to the map
        let map = unsafe { Map::from_parts_unchecked(data, rows, cols, row_stride, col_stride) };
        Self::from_map(map)
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> Deref for Ref<'a, A, M, S> {
    type Target = Map<'a, A, S>;

    fn deref(&self) -> &Self::Target {
        &self.map
    }
}

impl<'a, A: PlainStorage, S: StridePolicy> DerefMut for Ref<'a, A, Mut, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.map
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> DenseBase for Ref<'a, A, M, S> {
    type Scalar = A::Scalar;
    type Kind = RefView;
    type Order = A::Order;
    type PlainObject = A;

    const ROWS: usize = A::ROWS;
    const COLS: usize = A::COLS;

    fn rows(&self) -> usize {
        self.map.rows()
    }

    fn cols(&self) -> usize {
        self.map.cols()
    }

    fn coeff(&self, i: usize, j: usize) -> A::Scalar {
        self.map.coeff(i, j)
    }
}

impl<'a, A: PlainStorage, M: Mutability, S: StridePolicy> fmt::Debug for Ref<'a, A, M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref(mutable={}, {:?})", M::MUTABLE, self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Matrix4, MatrixX, MatrixXR, VectorX};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_over_slice() {
        let mut storage = vec![0u32; 6];
        {
            let mut map = Map::<MatrixXR<u32>>::from_slice_mut(&mut storage, 2, 3).unwrap();
            map.set_coeff(1, 0, 7);
            map[(0, 2)] = 9;
            assert_eq!(map.coeff(1, 0), 7);
        }
        assert_eq!(storage, vec![0, 0, 9, 7, 0, 0]);
    }

    #[test]
    fn test_contiguous_map_rejects_wrong_order() {
        let mut storage = vec![0.0f64; 16];
        let err = unsafe {
            Map::<MatrixXR<f64>>::from_raw_parts(storage.as_mut_ptr(), 4, 4, 1, 4).unwrap_err()
        };
        assert!(matches!(err, DenseError::Strides { .. }));

        let ok = unsafe { Map::<MatrixX<f64>>::from_raw_parts(storage.as_mut_ptr(), 4, 4, 1, 4) };
        assert!(ok.is_ok());
    }

    #[test]
    fn test_fixed_map_checks_extents() {
        let mut storage = vec![0i32; 12];
        let err = Map::<Matrix4<i32>>::from_slice_mut(&mut storage, 3, 4).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_strided_map() {
        let mut storage: Vec<i64> = (0..12).collect();
        // every other row of a row-major 6x2 block, walked backwards
        let map = unsafe {
            Map::<MatrixX<i64>, Strided>::from_raw_parts(storage.as_mut_ptr().add(10), 3, 2, -4, 1)
                .unwrap()
        };
        assert_eq!(map.to_row_major_vec(), vec![10, 11, 6, 7, 2, 3]);
        assert_eq!(map.eval().as_slice(), &[10, 6, 2, 11, 7, 3]);
    }

    #[test]
    fn test_vector_linear_index() {
        let mut storage = vec![1.0f32, 2.0, 3.0];
        let mut map = Map::<VectorX<f32>>::from_slice_mut(&mut storage, 3, 1).unwrap();
        map[2] = 30.0;
        map.fill(1.0);
        map[0] = 5.0;
        assert_eq!(map[0], 5.0);
        drop(map);
        assert_eq!(storage, vec![5.0, 1.0, 1.0]);
    }

    #[test]
    fn test_ref_mutability() {
        let mut m = MatrixX::<u8>::zeros(2, 2).unwrap();
        {
            let mut r = Ref::from_plain(&mut m);
            r[(1, 1)] = 4;
            r.assign(&MatrixX::<u8>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap());
        }
        assert_eq!(m.to_row_major_vec(), vec![1, 2, 3, 4]);

        let c = Ref::from_plain_ref(&m);
        assert_eq!(c.coeff(1, 0), 3);
        assert_eq!(c.eval(), m);
    }
}
