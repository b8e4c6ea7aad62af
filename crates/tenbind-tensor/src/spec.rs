//! Tensor specifications: what a native type requires of a host array.

use std::fmt;

use tenbind_runtime::{ArrayOrder, DType};

/// Memory order a tensor must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contiguity {
    /// C-contiguous
    RowMajor,
    /// Fortran-contiguous
    ColMajor,
    /// Arbitrary strides
    Any,
}

impl Contiguity {
    /// Order a host array is converted to when it doesn't satisfy `self`
    pub fn array_order(&self) -> ArrayOrder {
        match self {
            Contiguity::RowMajor => ArrayOrder::C,
            Contiguity::ColMajor => ArrayOrder::Fortran,
            Contiguity::Any => ArrayOrder::Neither,
        }
    }

    /// NumPy order character used in display names
    pub fn order_char(&self) -> char {
        self.array_order().as_char()
    }
}

impl fmt::Display for Contiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contiguity::RowMajor => write!(f, "row-major (C) contiguous"),
            Contiguity::ColMajor => write!(f, "column-major (Fortran) contiguous"),
            Contiguity::Any => write!(f, "strided"),
        }
    }
}

/// Requirements a host array must meet to bind as a tensor.
///
/// Only ranks 1 and 2 exist. `extents[axis]` is `None` for a dynamic axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorSpec {
    /// Element dtype
    pub dtype: DType,
    /// Number of dimensions (1 or 2)
    pub rank: usize,
    /// Fixed extent per axis
    pub extents: [Option<usize>; 2],
    /// Required memory order
    pub contiguity: Contiguity,
    /// Whether the native side writes through the view
    pub writable: bool,
}

impl TensorSpec {
    /// Create a spec with dynamic extents, any strides, read-only access
    pub fn new(dtype: DType, rank: usize) -> Self {
        debug_assert!(rank == 1 || rank == 2, "only vectors and matrices are supported");
        Self {
            dtype,
            rank,
            extents: [None; 2],
            contiguity: Contiguity::Any,
            writable: false,
        }
    }

    /// Fix the extent of `axis`
    pub fn with_extent(mut self, axis: usize, extent: Option<usize>) -> Self {
        self.extents[axis] = extent;
        self
    }

    /// Require a memory order
    pub fn with_contiguity(mut self, contiguity: Contiguity) -> Self {
        self.contiguity = contiguity;
        self
    }

    /// Require a writeable array
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Canonical display name, e.g.
    /// `numpy.ndarray[dtype=float64, shape=(*, 3), order='F']`
    pub fn name(&self) -> String {
        let shape = self.extents[..self.rank]
            .iter()
            .map(|extent| match extent {
                Some(n) => n.to_string(),
                None => "*".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "numpy.ndarray[dtype={}, shape=({}), order='{}']",
            self.dtype,
            shape,
            self.contiguity.order_char()
        )
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
