//! Host Array Data Types
//!
//! The numeric element types a host array can hold, the [`Element`] trait
//! mapping Rust scalars onto them, and the dtype-dispatched element access
//! used when an array has to be converted from one dtype to another.

use std::fmt;
use std::str::FromStr;

use crate::error::RuntimeError;

// ============================================================================
// DType - Host Data Type Representation
// ============================================================================

/// Host array data type.
///
/// Only numeric types are representable; there is no bool, complex or
/// object dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,

    /// Unsigned 8-bit integer
    UInt8,
    /// Unsigned 16-bit integer
    UInt16,
    /// Unsigned 32-bit integer
    UInt32,
    /// Unsigned 64-bit integer
    UInt64,

    /// 32-bit floating point
    Float32,
    /// 64-bit floating point
    Float64,
}

impl DType {
    /// Get the size in bytes for this dtype
    pub fn size(&self) -> usize {
        match self {
            DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    /// Get the alignment requirement for this dtype
    pub fn alignment(&self) -> usize {
        self.size()
    }

    /// Get the buffer-protocol type character
    pub fn type_char(&self) -> char {
        match self {
            DType::Int8 => 'b',
            DType::Int16 => 'h',
            DType::Int32 => 'i',
            DType::Int64 => 'q',
            DType::UInt8 => 'B',
            DType::UInt16 => 'H',
            DType::UInt32 => 'I',
            DType::UInt64 => 'Q',
            DType::Float32 => 'f',
            DType::Float64 => 'd',
        }
    }

    /// Get the dtype name (e.g., "float64")
    pub fn name(&self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    /// Check if this is a signed type
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::Float32
                | DType::Float64
        )
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DType {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" | "i1" | "b" => Ok(DType::Int8),
            "int16" | "i2" | "h" => Ok(DType::Int16),
            "int32" | "i4" | "i" => Ok(DType::Int32),
            "int64" | "i8" | "q" => Ok(DType::Int64),
            "uint8" | "u1" | "B" => Ok(DType::UInt8),
            "uint16" | "u2" | "H" => Ok(DType::UInt16),
            "uint32" | "u4" | "I" => Ok(DType::UInt32),
            "uint64" | "u8" | "Q" => Ok(DType::UInt64),
            "float32" | "f4" | "f" => Ok(DType::Float32),
            "float64" | "f8" | "d" | "float" => Ok(DType::Float64),
            _ => Err(RuntimeError::UnsupportedDtype(s.to_string())),
        }
    }
}

// ============================================================================
// ScalarValue - dtype-erased element
// ============================================================================

/// A single array element with its dtype erased.
///
/// Used for dtype conversion, where the source and destination element
/// types are only known at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    /// Any signed integer
    Int(i64),
    /// Any unsigned integer
    UInt(u64),
    /// Any floating point value
    Float(f64),
}

// ============================================================================
// Element - Rust scalar <-> dtype mapping
// ============================================================================

/// Trait for Rust types that can be stored in a host array
pub trait Element: Copy + PartialEq + fmt::Debug + 'static {
    /// The dtype holding values of this type
    const DTYPE: DType;

    /// Erase the type of this value
    fn to_scalar(self) -> ScalarValue;

    /// Convert an erased value, truncating or wrapping like an unchecked
    /// `astype` would.
    fn from_scalar(value: ScalarValue) -> Self;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident, $variant:ident, $wide:ty;)*) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn to_scalar(self) -> ScalarValue {
                    ScalarValue::$variant(self as $wide)
                }

                fn from_scalar(value: ScalarValue) -> Self {
                    match value {
                        ScalarValue::Int(v) => v as $ty,
                        ScalarValue::UInt(v) => v as $ty,
                        ScalarValue::Float(v) => v as $ty,
                    }
                }
            }
        )*
    };
}

impl_element! {
    i8 => Int8, Int, i64;
    i16 => Int16, Int, i64;
    i32 => Int32, Int, i64;
    i64 => Int64, Int, i64;
    u8 => UInt8, UInt, u64;
    u16 => UInt16, UInt, u64;
    u32 => UInt32, UInt, u64;
    u64 => UInt64, UInt, u64;
    f32 => Float32, Float, f64;
    f64 => Float64, Float, f64;
}

macro_rules! with_dtype {
    ($dtype:expr, $ty:ident => $body:expr) => {
        match $dtype {
            DType::Int8 => { type $ty = i8; $body }
            DType::Int16 => { type $ty = i16; $body }
            DType::Int32 => { type $ty = i32; $body }
            DType::Int64 => { type $ty = i64; $body }
            DType::UInt8 => { type $ty = u8; $body }
            DType::UInt16 => { type $ty = u16; $body }
            DType::UInt32 => { type $ty = u32; $body }
            DType::UInt64 => { type $ty = u64; $body }
            DType::Float32 => { type $ty = f32; $body }
            DType::Float64 => { type $ty = f64; $body }
        }
    };
}

/// Read one element of the given dtype.
///
/// # Safety
///
/// `ptr` must point to `dtype.size()` readable bytes.
pub(crate) unsafe fn read_scalar(ptr: *const u8, dtype: DType) -> ScalarValue {
    with_dtype!(dtype, T => ptr.cast::<T>().read_unaligned().to_scalar())
}

/// Write one element of the given dtype.
///
/// # Safety
///
/// `ptr` must point to `dtype.size()` writable bytes.
pub(crate) unsafe fn write_scalar(ptr: *mut u8, dtype: DType, value: ScalarValue) {
    with_dtype!(dtype, T => ptr.cast::<T>().write_unaligned(T::from_scalar(value)))
}
