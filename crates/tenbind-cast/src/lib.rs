//! # Tenbind Casters
//!
//! Bidirectional conversion between dense native aggregates, columnar
//! record batches and host values.
//!
//! Every dense type falls into one caster category, resolved at compile
//! time by [`classify`]:
//!
//! - **plain** aggregates import by copy and export by copy or move, or by
//!   reference through the `unsafe` [`ToHostRef`] ([`plain`])
//! - **expressions** only export, by evaluating first ([`expr`])
//! - **maps** and **refs** bind host buffers without copying ([`map`])
//!
//! Columnar records pass through whole via registered hooks
//! ([`columnar`]). A [`Converter`] applies a [`CastConfig`] to one call.
//!
//! ## Example
//!
//! ```
//! use tenbind_cast::{cast, to_host, ExportPolicy};
//! use tenbind_dense::MatrixX;
//!
//! let m = MatrixX::<f64>::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let host = to_host(m.clone(), ExportPolicy::Copy);
//! let back: MatrixX<f64> = cast(&host).unwrap();
//! assert_eq!(back, m);
//! ```

pub mod caster;
pub mod classify;
pub mod columnar;
pub mod config;
pub mod converter;
pub mod error;
pub mod expr;
pub mod map;
pub mod plain;

// Re-export main types for convenience
pub use caster::{
    cast, load, to_host, CastName, FromHost, IntoHost, ToHost, ToHostRef, TypeCaster,
};
pub use classify::{category, classify, is_expression, is_map, is_plain, is_ref, Category};
pub use columnar::{
    Columnar, ColumnarRegistry, PassThroughCaster, PassThroughHooks, RecordBatch, Table,
};
pub use config::CastConfig;
pub use converter::Converter;
pub use error::{CastError, CastResult, ColumnarError};
pub use expr::ExprCaster;
pub use map::{MapCaster, RefCaster};
pub use plain::{PlainCaster, MOVE_THRESHOLD_BYTES};

pub use tenbind_tensor::{CastFlags, CleanupList, ExportPolicy};
