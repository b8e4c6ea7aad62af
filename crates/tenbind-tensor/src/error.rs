//! Import Rejections
//!
//! Every reason a host value can fail to bind to a native parameter. A
//! rejection is an ordinary `Err`: the caller is free to try the next
//! overload, or to retry with conversion enabled.

use smol_str::SmolStr;
use tenbind_runtime::DType;
use thiserror::Error;

use crate::spec::Contiguity;

/// Result type for import operations
pub type LoadResult<T> = Result<T, Rejection>;

/// Reasons a host value was rejected on import
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The host value is not an array at all
    #[error("expected numpy.ndarray, got {type_name}")]
    NotAnArray {
        /// Host type name of the rejected value
        type_name: SmolStr,
    },

    /// Element type differs and conversion is not allowed
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch {
        /// Dtype of the native element type
        expected: DType,
        /// Dtype of the host array
        actual: DType,
    },

    /// Number of dimensions differs
    #[error("expected a {expected}-dimensional array, got {actual} dimensions")]
    RankMismatch {
        /// Native rank
        expected: usize,
        /// Host array rank
        actual: usize,
    },

    /// A compile-time extent differs from the runtime one
    #[error("expected extent {expected} along axis {axis}, got {actual}")]
    ExtentMismatch {
        /// Axis index
        axis: usize,
        /// Fixed native extent
        expected: usize,
        /// Host array extent
        actual: usize,
    },

    /// Strides are incompatible with the required memory order
    #[error("array is not {required}")]
    Layout {
        /// Required memory order
        required: Contiguity,
    },

    /// A mutable view was requested over a read-only array
    #[error("array is not writeable")]
    ReadOnly,

    /// A columnar pass-through rejected the value
    #[error("expected {expected}, got {actual}")]
    NotColumnar {
        /// Display tag of the expected record type
        expected: SmolStr,
        /// Host type name of the rejected value
        actual: SmolStr,
    },
}

impl Rejection {
    /// Create a not-an-array rejection for `type_name`
    pub fn not_an_array(type_name: &str) -> Self {
        Rejection::NotAnArray {
            type_name: SmolStr::new(type_name),
        }
    }

    /// Check if retrying with conversion enabled could succeed
    pub fn is_convertible(&self) -> bool {
        matches!(
            self,
            Rejection::DTypeMismatch { .. } | Rejection::Layout { .. }
        )
    }

    /// Check if this is a shape-related rejection
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Rejection::RankMismatch { .. } | Rejection::ExtentMismatch { .. }
        )
    }
}
