//! Error types for building dense aggregates and views.

use thiserror::Error;

/// Result type for dense aggregate construction
pub type DenseResult<T> = Result<T, DenseError>;

/// Dense aggregate error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DenseError {
    /// A runtime extent disagrees with a compile-time one
    #[error("expected {expected} {axis}, got {actual}")]
    FixedExtent {
        /// "rows" or "cols"
        axis: &'static str,
        /// Compile-time extent
        expected: usize,
        /// Requested extent
        actual: usize,
    },

    /// Element count doesn't match the requested shape
    #[error("cannot shape {len} elements as a {rows}x{cols} matrix")]
    DataLength {
        /// Number of elements supplied
        len: usize,
        /// Requested rows
        rows: usize,
        /// Requested columns
        cols: usize,
    },

    /// Strides don't give the contiguity a view requires
    #[error("strides ({row_stride}, {col_stride}) are not {order} contiguous for a {rows}x{cols} view")]
    Strides {
        /// Stride between rows
        row_stride: isize,
        /// Stride between columns
        col_stride: isize,
        /// Rows of the view
        rows: usize,
        /// Columns of the view
        cols: usize,
        /// Required order
        order: &'static str,
    },
}

impl DenseError {
    /// Check if this error is about the shape rather than the memory layout
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            DenseError::FixedExtent { .. } | DenseError::DataLength { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DenseError::FixedExtent {
            axis: "rows",
            expected: 3,
            actual: 4,
        };
        assert_eq!(err.to_string(), "expected 3 rows, got 4");
        assert!(err.is_shape_error());

        let err = DenseError::Strides {
            row_stride: 1,
            col_stride: 4,
            rows: 4,
            cols: 4,
            order: "row-major",
        };
        assert!(!err.is_shape_error());
        assert_eq!(
            err.to_string(),
            "strides (1, 4) are not row-major contiguous for a 4x4 view"
        );
    }
}
