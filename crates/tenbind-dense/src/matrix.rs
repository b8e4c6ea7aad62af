//! Owning matrices and vectors.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Index, IndexMut, Sub};

use crate::base::{check_extent, DenseBase, PlainStorage, StorageOrder, DYN};
use crate::base::{ColMajor, RowMajor};
use crate::error::{DenseError, DenseResult};
use crate::expr::{CwiseBinary, Difference, Sum};
use crate::kind::Plain;
use crate::map::{Contiguous, Map};
use crate::scalar::Scalar;

/// An owning `R x C` matrix stored in order `O`.
///
/// `R` and `C` are compile-time extents or [`DYN`]. A matrix with a fixed
/// extent can never be resized along that axis. Storage is always packed,
/// so the row and column strides follow from the shape and the order.
#[derive(Clone, PartialEq)]
pub struct Matrix<T, const R: usize, const C: usize, O = ColMajor> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    _order: PhantomData<O>,
}

/// Fixed-size column vector
pub type Vector<T, const N: usize> = Matrix<T, N, 1>;
/// Fixed-size row vector
pub type RowVector<T, const N: usize> = Matrix<T, 1, N, RowMajor>;
/// Three-element column vector
pub type Vector3<T> = Matrix<T, 3, 1>;
/// Four-element column vector
pub type Vector4<T> = Matrix<T, 4, 1>;
/// Dynamic column vector
pub type VectorX<T> = Matrix<T, DYN, 1>;
/// Three-element row vector
pub type RowVector3<T> = Matrix<T, 1, 3, RowMajor>;
/// Dynamic row vector
pub type RowVectorX<T> = Matrix<T, 1, DYN, RowMajor>;
/// 3x3 column-major matrix
pub type Matrix3<T> = Matrix<T, 3, 3>;
/// 4x4 column-major matrix
pub type Matrix4<T> = Matrix<T, 4, 4>;
/// 4x4 row-major matrix
pub type Matrix4R<T> = Matrix<T, 4, 4, RowMajor>;
/// Dynamic column-major matrix
pub type MatrixX<T> = Matrix<T, DYN, DYN>;
/// Dynamic row-major matrix
pub type MatrixXR<T> = Matrix<T, DYN, DYN, RowMajor>;

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> Matrix<T, R, C, O> {
    fn offset(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.rows && j < self.cols,
            "index ({}, {}) out of bounds for a {}x{} matrix",
            i,
            j,
            self.rows,
            self.cols
        );
        if O::ROW_MAJOR {
            i * self.cols + j
        } else {
            j * self.rows + i
        }
    }

    fn checked_shape(rows: usize, cols: usize) -> DenseResult<()> {
        check_extent("rows", R, rows)?;
        check_extent("cols", C, cols)
    }

    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> DenseResult<Self> {
        Self::checked_shape(rows, cols)?;
        Ok(Self {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
            _order: PhantomData,
        })
    }

    /// Create a matrix from elements listed row by row
    pub fn from_row_slice(rows: usize, cols: usize, values: &[T]) -> DenseResult<Self> {
        if values.len() != rows * cols {
            return Err(DenseError::DataLength {
                len: values.len(),
                rows,
                cols,
            });
        }
        Self::checked_shape(rows, cols)?;
        Ok(Self::from_fn(rows, cols, |i, j| values[i * cols + j]))
    }

    /// Create a matrix from elements listed column by column
    pub fn from_column_slice(rows: usize, cols: usize, values: &[T]) -> DenseResult<Self> {
        if values.len() != rows * cols {
            return Err(DenseError::DataLength {
                len: values.len(),
                rows,
                cols,
            });
        }
        Self::checked_shape(rows, cols)?;
        Ok(Self::from_fn(rows, cols, |i, j| values[j * rows + i]))
    }

    /// Create a vector from its elements.
    ///
    /// Row vector types become `1 x n`, everything else `n x 1`.
    pub fn from_vector_slice(values: &[T]) -> DenseResult<Self> {
        if R == 1 {
            Self::from_row_slice(1, values.len(), values)
        } else {
            Self::from_column_slice(values.len(), 1, values)
        }
    }

    /// Resize to `rows x cols`, discarding the contents
    pub fn resize(&mut self, rows: usize, cols: usize) -> DenseResult<()> {
        Self::checked_shape(rows, cols)?;
        self.data.clear();
        self.data.resize(rows * cols, T::zero());
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Get the element at `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        (i < self.rows && j < self.cols).then(|| &self.data[self.offset(i, j)])
    }

    /// Get the packed storage
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// View the storage as a contiguous map
    pub fn as_map_mut(&mut self) -> Map<'_, Self, Contiguous> {
        let (rows, cols) = (self.rows, self.cols);
        let (row_stride, col_stride) = (self.row_stride(), self.col_stride());
        // SAFETY: packed storage owned by `self`, exclusively borrowed for the
        // lifetime of the map
        unsafe {
            Map::from_parts_unchecked(self.data.as_mut_ptr(), rows, cols, row_stride, col_stride)
        }
    }

    /// Copy into a matrix with the same shape and the other storage order
    pub fn to_order<P: StorageOrder>(&self) -> Matrix<T, R, C, P> {
        Matrix::from_fn(self.rows, self.cols, |i, j| self[(i, j)])
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> Default for Matrix<T, R, C, O> {
    fn default() -> Self {
        let rows = if R == DYN { 0 } else { R };
        let cols = if C == DYN { 0 } else { C };
        Self {
            data: vec![T::zero(); rows * cols],
            rows,
            cols,
            _order: PhantomData,
        }
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> DenseBase for Matrix<T, R, C, O> {
    type Scalar = T;
    type Kind = Plain;
    type Order = O;
    type PlainObject = Self;

    const ROWS: usize = R;
    const COLS: usize = C;

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn coeff(&self, i: usize, j: usize) -> T {
        self.data[self.offset(i, j)]
    }

    fn eval(&self) -> Self {
        self.clone()
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> PlainStorage
    for Matrix<T, R, C, O>
{
    fn try_with_shape(rows: usize, cols: usize) -> DenseResult<Self> {
        Self::zeros(rows, cols)
    }

    fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        if let Err(err) = Self::checked_shape(rows, cols) {
            panic!("{}", err);
        }

        let mut data = Vec::with_capacity(rows * cols);
        if O::ROW_MAJOR {
            for i in 0..rows {
                for j in 0..cols {
                    data.push(f(i, j));
                }
            }
        } else {
            for j in 0..cols {
                for i in 0..rows {
                    data.push(f(i, j));
                }
            }
        }

        Self {
            data,
            rows,
            cols,
            _order: PhantomData,
        }
    }

    fn data(&self) -> &[T] {
        &self.data
    }

    fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> Index<(usize, usize)>
    for Matrix<T, R, C, O>
{
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[self.offset(i, j)]
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> IndexMut<(usize, usize)>
    for Matrix<T, R, C, O>
{
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        let offset = self.offset(i, j);
        &mut self.data[offset]
    }
}

/// Linear index into the packed storage (the logical index for vectors)
impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> Index<usize>
    for Matrix<T, R, C, O>
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> IndexMut<usize>
    for Matrix<T, R, C, O>
{
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<'a, T, const R: usize, const C: usize, O, Rhs> Add<&'a Rhs> for &'a Matrix<T, R, C, O>
where
    T: Scalar,
    O: StorageOrder,
    Rhs: DenseBase<Scalar = T>,
{
    type Output = CwiseBinary<'a, Matrix<T, R, C, O>, Rhs, Sum>;

    fn add(self, rhs: &'a Rhs) -> Self::Output {
        CwiseBinary::new(self, rhs, Sum)
    }
}

impl<'a, T, const R: usize, const C: usize, O, Rhs> Sub<&'a Rhs> for &'a Matrix<T, R, C, O>
where
    T: Scalar,
    O: StorageOrder,
    Rhs: DenseBase<Scalar = T>,
{
    type Output = CwiseBinary<'a, Matrix<T, R, C, O>, Rhs, Difference>;

    fn sub(self, rhs: &'a Rhs) -> Self::Output {
        CwiseBinary::new(self, rhs, Difference)
    }
}

impl<T: Scalar, const R: usize, const C: usize, O: StorageOrder> fmt::Debug
    for Matrix<T, R, C, O>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix<{}x{}, {}>[", self.rows, self.cols, O::NAME)?;
        for i in 0..self.rows {
            if i > 0 {
                write!(f, "; ")?;
            }
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self[(i, j)])?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_storage_orders() {
        let values = [1u32, 2, 3, 4, 5, 6];
        let col = MatrixX::<u32>::from_row_slice(2, 3, &values).unwrap();
        let row = MatrixXR::<u32>::from_row_slice(2, 3, &values).unwrap();

        assert_eq!(col.as_slice(), &[1, 4, 2, 5, 3, 6]);
        assert_eq!(row.as_slice(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!((col.row_stride(), col.col_stride()), (1, 2));
        assert_eq!((row.row_stride(), row.col_stride()), (3, 1));
        assert_eq!(col[(1, 2)], 6);
        assert_eq!(row[(1, 2)], 6);
    }

    #[test]
    fn test_fixed_extents() {
        assert!(Matrix4::<f64>::zeros(4, 4).is_ok());
        assert_eq!(
            Matrix4::<f64>::zeros(3, 4).unwrap_err(),
            DenseError::FixedExtent {
                axis: "rows",
                expected: 4,
                actual: 3
            }
        );
        assert!(Vector3::<i32>::from_vector_slice(&[1, 2]).is_err());

        let mut m = MatrixX::<f32>::default();
        assert_eq!((m.rows(), m.cols()), (0, 0));
        m.resize(2, 5).unwrap();
        assert_eq!(m.size(), 10);
    }

    #[test]
    fn test_vectors() {
        let v = Vector3::<i32>::from_vector_slice(&[1, 2, 3]).unwrap();
        assert_eq!((v.rows(), v.cols()), (3, 1));
        assert_eq!(v[2], 3);

        let r = RowVectorX::<f64>::from_vector_slice(&[0.5, 1.5]).unwrap();
        assert_eq!((r.rows(), r.cols()), (1, 2));
        assert!(<RowVectorX<f64> as DenseBase>::IS_VECTOR);
        assert_eq!(<MatrixX<f64> as DenseBase>::RANK, 2);
    }

    #[test]
    fn test_compile_time_size() {
        assert_eq!(<Matrix4<u8> as DenseBase>::SIZE_AT_COMPILE_TIME, Some(16));
        assert_eq!(<VectorX<u8> as DenseBase>::SIZE_AT_COMPILE_TIME, None);
        assert!(<Matrix4R<u8> as DenseBase>::ROW_MAJOR);
    }

    #[test]
    fn test_mixed_order_arithmetic() {
        let a = MatrixX::<u32>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        let b = MatrixXR::<u32>::from_row_slice(2, 2, &[10, 20, 30, 40]).unwrap();

        let sum = (&a + &b).eval();
        assert_eq!(sum.to_row_major_vec(), vec![11, 22, 33, 44]);
        assert_eq!(sum.as_slice(), &[11, 33, 22, 44]);

        let diff: MatrixX<u32> = (&a - &b).eval();
        assert_eq!(diff[(0, 0)], 1u32.wrapping_sub(10));

        let col_major = b.to_order::<ColMajor>();
        assert_eq!(col_major.to_row_major_vec(), b.to_row_major_vec());
        assert_eq!(col_major.as_slice(), &[10, 30, 20, 40]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_out_of_bounds() {
        let m = Matrix3::<f32>::default();
        let _ = m[(3, 0)];
    }

    #[test]
    fn test_debug() {
        let m = Matrix::<i8, 2, 2, RowMajor>::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(format!("{:?}", m), "Matrix<2x2, row-major>[1, 2; 3, 4]");
    }
}
