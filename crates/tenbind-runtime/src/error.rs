//! Error Types for the Host Runtime
//!
//! Errors raised by host-side array and object operations. These are the
//! failures a dynamic runtime would surface as exceptions (`IndexError`,
//! `ValueError`, ...); the casting layer never lets them escape as panics.

use thiserror::Error;

use crate::dtype::DType;

/// Result type for host runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Host runtime error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Index outside the array bounds
    #[error("index {index:?} out of bounds for array of shape {shape:?}")]
    IndexOutOfBounds {
        /// The offending index
        index: Vec<usize>,
        /// Shape of the array
        shape: Vec<usize>,
    },

    /// Element type requested doesn't match the array dtype
    #[error("dtype mismatch: array holds {actual}, requested {expected}")]
    DTypeMismatch {
        /// Requested dtype
        expected: DType,
        /// Actual array dtype
        actual: DType,
    },

    /// Data length doesn't fit the requested shape
    #[error("cannot shape {len} elements as {shape:?}")]
    ShapeMismatch {
        /// Number of elements supplied
        len: usize,
        /// Requested shape
        shape: Vec<usize>,
    },

    /// Axis argument out of range
    #[error("axis {axis} is out of bounds for array of dimension {ndim}")]
    AxisOutOfBounds {
        /// Requested axis
        axis: usize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Invalid slice bounds
    #[error("invalid slice {start}:{end} for dimension of size {dim}")]
    InvalidSlice {
        /// Slice start
        start: usize,
        /// Slice end
        end: usize,
        /// Dimension size
        dim: usize,
    },

    /// Write attempted on a read-only array
    #[error("assignment destination is read-only")]
    ReadOnly,

    /// Unknown dtype string
    #[error("unsupported dtype: {0}")]
    UnsupportedDtype(String),
}

impl RuntimeError {
    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: &[usize], shape: &[usize]) -> Self {
        RuntimeError::IndexOutOfBounds {
            index: index.to_vec(),
            shape: shape.to_vec(),
        }
    }

    /// Create a dtype mismatch error
    pub fn dtype_mismatch(expected: DType, actual: DType) -> Self {
        RuntimeError::DTypeMismatch { expected, actual }
    }

    /// Create a shape mismatch error
    pub fn shape_mismatch(len: usize, shape: &[usize]) -> Self {
        RuntimeError::ShapeMismatch {
            len,
            shape: shape.to_vec(),
        }
    }

    /// Check if this is an indexing error
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::IndexOutOfBounds { .. } | RuntimeError::AxisOutOfBounds { .. }
        )
    }

    /// Check if this is a type-related error
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            RuntimeError::DTypeMismatch { .. } | RuntimeError::UnsupportedDtype(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error() {
        let err = RuntimeError::index_out_of_bounds(&[3, 0], &[3, 4]);
        assert!(err.is_index_error());
        assert!(err.to_string().contains("[3, 0]"));
    }

    #[test]
    fn test_dtype_error() {
        let err = RuntimeError::dtype_mismatch(DType::Int32, DType::UInt32);
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "dtype mismatch: array holds uint32, requested int32"
        );
    }

    #[test]
    fn test_read_only_message() {
        assert_eq!(
            RuntimeError::ReadOnly.to_string(),
            "assignment destination is read-only"
        );
    }
}
