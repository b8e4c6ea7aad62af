//! Host values.

use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::array::NdArray;
use crate::capsule::Capsule;
use crate::object::HostObject;

/// A value living in the host runtime.
///
/// Scalars are held inline; arrays, capsules and objects are reference
/// counted handles, so cloning a `HostValue` never copies array data.
#[derive(Clone)]
pub enum HostValue {
    /// The `None` singleton
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(SmolStr),
    /// Byte string
    Bytes(Rc<[u8]>),
    /// Tuple
    Tuple(Rc<[HostValue]>),
    /// N-dimensional array
    Array(NdArray),
    /// Owner of a native heap allocation
    Capsule(Capsule),
    /// Any other object
    Object(HostObject),
}

impl HostValue {
    /// Get the host type name
    pub fn type_name(&self) -> &str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Bytes(_) => "bytes",
            HostValue::Tuple(_) => "tuple",
            HostValue::Array(_) => "numpy.ndarray",
            HostValue::Capsule(_) => "PyCapsule",
            HostValue::Object(obj) => obj.type_name(),
        }
    }

    /// Check for `None`
    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    /// Get the array, if this is one
    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            HostValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Get the capsule, if this is one
    pub fn as_capsule(&self) -> Option<&Capsule> {
        match self {
            HostValue::Capsule(capsule) => Some(capsule),
            _ => None,
        }
    }

    /// Get the object, if this is one
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the integer value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(v) => Some(*v),
            HostValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Get the float value (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Float(v) => Some(*v),
            HostValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Reference count of a handle value; `None` for inline scalars
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            HostValue::Array(array) => Some(array.ref_count()),
            HostValue::Capsule(capsule) => Some(capsule.ref_count()),
            HostValue::Object(obj) => Some(obj.ref_count()),
            HostValue::Bytes(bytes) => Some(Rc::strong_count(bytes)),
            HostValue::Tuple(items) => Some(Rc::strong_count(items)),
            _ => None,
        }
    }

    /// Identity comparison (`is`)
    pub fn is(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::None, HostValue::None) => true,
            (HostValue::Array(a), HostValue::Array(b)) => a.ptr_eq(b),
            (HostValue::Capsule(a), HostValue::Capsule(b)) => a.ptr_eq(b),
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            (HostValue::Bytes(a), HostValue::Bytes(b)) => Rc::ptr_eq(a, b),
            (HostValue::Tuple(a), HostValue::Tuple(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Bytes(a), HostValue::Bytes(b)) => a == b,
            (HostValue::Tuple(a), HostValue::Tuple(b)) => a == b,
            _ => self.is(other),
        }
    }
}

impl From<NdArray> for HostValue {
    fn from(array: NdArray) -> Self {
        HostValue::Array(array)
    }
}

impl From<Capsule> for HostValue {
    fn from(capsule: Capsule) -> Self {
        HostValue::Capsule(capsule)
    }
}

impl From<HostObject> for HostValue {
    fn from(obj: HostObject) -> Self {
        HostValue::Object(obj)
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        HostValue::Int(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Float(v)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(SmolStr::new(s))
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => write!(f, "None"),
            HostValue::Bool(true) => write!(f, "True"),
            HostValue::Bool(false) => write!(f, "False"),
            HostValue::Int(v) => write!(f, "{}", v),
            HostValue::Float(v) => write!(f, "{:?}", v),
            HostValue::Str(s) => write!(f, "'{}'", s),
            HostValue::Bytes(bytes) => write!(f, "<bytes of length {}>", bytes.len()),
            HostValue::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            HostValue::Array(array) => write!(
                f,
                "array(shape={:?}, dtype={})",
                array.shape(),
                array.dtype()
            ),
            HostValue::Capsule(capsule) => write!(f, "{:?}", capsule),
            HostValue::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Array(array) => write!(f, "{:?}", array),
            other => write!(f, "{}", other),
        }
    }
}
