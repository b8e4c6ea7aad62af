//! Error Types for Casting
//!
//! Import failures surface as [`CastError`]; most of them wrap the
//! [`Rejection`] reported by the tensor layer. Export never fails.

use smol_str::SmolStr;
use tenbind_dense::DenseError;
use tenbind_tensor::Rejection;
use thiserror::Error;

/// Result type for cast operations
pub type CastResult<T> = Result<T, CastError>;

/// Cast error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CastError {
    /// The host value can't bind to the native type
    #[error("import rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The native aggregate couldn't take the loaded shape
    #[error("cannot build native value: {0}")]
    Dense(#[from] DenseError),

    /// A caster was asked for its value before a successful load
    #[error("caster holds no value")]
    NotLoaded,

    /// Columnar registry or batch error
    #[error(transparent)]
    Columnar(#[from] ColumnarError),
}

impl CastError {
    /// Check if this is an import rejection
    pub fn is_rejection(&self) -> bool {
        matches!(self, CastError::Rejected(_))
    }

    /// Get the underlying rejection, if any
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            CastError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Columnar batch and registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColumnarError {
    /// Hooks for the type were registered twice
    #[error("columnar type {tag} is already registered")]
    DuplicateRegistration {
        /// Display tag of the type
        tag: SmolStr,
    },

    /// No hooks were registered for the type
    #[error("no columnar hooks registered for {type_name}")]
    Unregistered {
        /// Rust type name
        type_name: &'static str,
    },

    /// Column count differs from the schema
    #[error("schema has {expected} fields, got {actual} columns")]
    ColumnCount {
        /// Fields in the schema
        expected: usize,
        /// Columns supplied
        actual: usize,
    },

    /// A column's type differs from its field
    #[error("column '{name}' should be {expected}, got {actual}")]
    ColumnType {
        /// Field name
        name: SmolStr,
        /// Field data type
        expected: &'static str,
        /// Column data type
        actual: &'static str,
    },

    /// Columns of one batch have different lengths
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    ColumnLength {
        /// Field name
        name: SmolStr,
        /// Rows of the first column
        expected: usize,
        /// Rows of this column
        actual: usize,
    },

    /// A batch doesn't share the table's schema
    #[error("batch {index} does not match the table schema")]
    SchemaMismatch {
        /// Index of the offending batch
        index: usize,
    },
}
