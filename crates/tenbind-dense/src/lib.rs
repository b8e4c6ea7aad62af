//! # Tenbind Dense Aggregates
//!
//! Native numeric aggregates as the casting layer sees them: owning
//! matrices and vectors with fixed or dynamic extents, non-owning map and
//! ref views, and lazy coefficient-wise expressions.
//!
//! ## Aggregate kinds
//!
//! Every type implements [`DenseBase`] and names its [`kind`]:
//!
//! | kind | types | owns storage | importable |
//! |---|---|---|---|
//! | [`Plain`] | [`Matrix`] and its aliases | yes | by copy |
//! | [`Expression`] | [`CwiseBinary`], [`Scaled`] | no | never |
//! | [`MapView`] | [`Map`] | no | zero copy |
//! | [`RefView`] | [`Ref`] | no | zero copy, binds only |
//!
//! ## Example
//!
//! ```
//! use tenbind_dense::{DenseBase, DenseExt, MatrixX, MatrixXR};
//!
//! let a = MatrixX::<f64>::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = MatrixXR::<f64>::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]).unwrap();
//! let sum = a.plus(&b).eval();
//! assert_eq!(sum.to_row_major_vec(), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

pub mod base;
pub mod error;
pub mod expr;
pub mod kind;
pub mod map;
pub mod matrix;
pub mod scalar;

// Re-export main types for convenience
pub use base::{packed_strides, ColMajor, DenseBase, PlainStorage, RowMajor, StorageOrder, DYN};
pub use error::{DenseError, DenseResult};
pub use expr::{BinaryOp, CwiseBinary, DenseExt, Difference, Product, Scaled, Sum};
pub use kind::{Expression, Kind, MapView, Plain, RefView};
pub use map::{Const, Contiguous, Map, Mut, Mutability, Ref, StridePolicy, Strided};
pub use matrix::{
    Matrix, Matrix3, Matrix4, Matrix4R, MatrixX, MatrixXR, RowVector, RowVector3, RowVectorX,
    Vector, Vector3, Vector4, VectorX,
};
pub use scalar::Scalar;
