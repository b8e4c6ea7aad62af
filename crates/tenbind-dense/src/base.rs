//! The traits shared by every dense aggregate.

use std::fmt;

use crate::error::DenseResult;
use crate::kind::{Kind, Plain};
use crate::scalar::Scalar;

/// Extent sentinel for an axis whose size is only known at runtime
pub const DYN: usize = usize::MAX;

mod sealed {
    pub trait Sealed {}
}

/// Storage order of an aggregate
pub trait StorageOrder: sealed::Sealed + Copy + Default + fmt::Debug + 'static {
    /// Elements of a row are adjacent in memory
    const ROW_MAJOR: bool;
    /// Order name used in messages
    const NAME: &'static str;
}

/// Row-major storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMajor;

/// Column-major storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColMajor;

impl sealed::Sealed for RowMajor {}
impl sealed::Sealed for ColMajor {}

impl StorageOrder for RowMajor {
    const ROW_MAJOR: bool = true;
    const NAME: &'static str = "row-major";
}

impl StorageOrder for ColMajor {
    const ROW_MAJOR: bool = false;
    const NAME: &'static str = "column-major";
}

/// Element strides `(row_stride, col_stride)` of a packed `rows x cols`
/// block in storage order `O`
pub fn packed_strides<O: StorageOrder>(rows: usize, cols: usize) -> (isize, isize) {
    if O::ROW_MAJOR {
        (cols as isize, 1)
    } else {
        (1, rows as isize)
    }
}

/// Check a runtime extent against a compile-time one
pub(crate) fn check_extent(axis: &'static str, fixed: usize, actual: usize) -> DenseResult<()> {
    if fixed != DYN && fixed != actual {
        return Err(crate::DenseError::FixedExtent {
            axis,
            expected: fixed,
            actual,
        });
    }
    Ok(())
}

/// A rank-1 or rank-2 array of scalars, owned, viewed or computed.
///
/// `(i, j)` is always the logical row and column, whatever the storage
/// order.
pub trait DenseBase {
    /// Element type
    type Scalar: Scalar;
    /// What kind of aggregate this is
    type Kind: Kind;
    /// Storage order (or preferred evaluation order for expressions)
    type Order: StorageOrder;
    /// The owning type this aggregate evaluates into
    type PlainObject: PlainStorage<Scalar = Self::Scalar>;

    /// Compile-time rows, or [`DYN`]
    const ROWS: usize;
    /// Compile-time columns, or [`DYN`]
    const COLS: usize;
    /// Vectors cross the host boundary as one-dimensional arrays
    const IS_VECTOR: bool = Self::ROWS == 1 || Self::COLS == 1;
    /// Host-side number of dimensions
    const RANK: usize = if Self::IS_VECTOR { 1 } else { 2 };
    /// Whether elements of a row are adjacent in memory
    const ROW_MAJOR: bool = <Self::Order as StorageOrder>::ROW_MAJOR;
    /// Total element count when both extents are fixed
    const SIZE_AT_COMPILE_TIME: Option<usize> = if Self::ROWS != DYN && Self::COLS != DYN {
        Some(Self::ROWS * Self::COLS)
    } else {
        None
    };

    /// Runtime rows
    fn rows(&self) -> usize;

    /// Runtime columns
    fn cols(&self) -> usize;

    /// Runtime element count
    fn size(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Element at logical position `(i, j)`; panics when out of bounds
    fn coeff(&self, i: usize, j: usize) -> Self::Scalar;

    /// Evaluate into a new owning aggregate
    fn eval(&self) -> Self::PlainObject {
        Self::PlainObject::from_fn(self.rows(), self.cols(), |i, j| self.coeff(i, j))
    }

    /// Elements in logical row-major order
    fn to_row_major_vec(&self) -> Vec<Self::Scalar> {
        let mut out = Vec::with_capacity(self.size());
        for i in 0..self.rows() {
            for j in 0..self.cols() {
                out.push(self.coeff(i, j));
            }
        }
        out
    }
}

/// An aggregate that owns packed storage in its own storage order.
pub trait PlainStorage: DenseBase<Kind = Plain, PlainObject = Self> + Sized {
    /// Create a zero-filled aggregate of the given runtime shape, failing
    /// if it disagrees with a fixed extent
    fn try_with_shape(rows: usize, cols: usize) -> DenseResult<Self>;

    /// Create an aggregate from a function of `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the shape disagrees with a fixed extent.
    fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> Self::Scalar) -> Self;

    /// Packed storage
    fn data(&self) -> &[Self::Scalar];

    /// Mutable packed storage
    fn data_mut(&mut self) -> &mut [Self::Scalar];

    /// Element step between consecutive rows
    fn row_stride(&self) -> isize {
        packed_strides::<Self::Order>(self.rows(), self.cols()).0
    }

    /// Element step between consecutive columns
    fn col_stride(&self) -> isize {
        packed_strides::<Self::Order>(self.rows(), self.cols()).1
    }

    /// Element step of a vector
    fn inner_stride(&self) -> isize {
        1
    }
}
