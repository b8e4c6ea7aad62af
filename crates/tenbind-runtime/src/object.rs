//! Opaque host objects.
//!
//! Anything that is not a number, string or array shows up on the host side
//! as a [`HostObject`]: a type name, an optional native payload carried by
//! reference, and a table of attributes.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::value::HostValue;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

struct ObjectInner {
    id: u64,
    type_name: SmolStr,
    payload: Option<Rc<dyn Any>>,
    attributes: RefCell<IndexMap<SmolStr, HostValue>>,
}

/// Reference-counted handle to an opaque host object.
///
/// Cloning the handle is an incref; dropping it is a decref.
#[derive(Clone)]
pub struct HostObject {
    inner: Rc<ObjectInner>,
}

impl HostObject {
    /// Create a new object with a given type name
    pub fn new(type_name: impl Into<SmolStr>) -> Self {
        Self::build(type_name.into(), None)
    }

    /// Create an object carrying a native payload
    pub fn with_payload(type_name: impl Into<SmolStr>, payload: Rc<dyn Any>) -> Self {
        Self::build(type_name.into(), Some(payload))
    }

    fn build(type_name: SmolStr, payload: Option<Rc<dyn Any>>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                type_name,
                payload,
                attributes: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Get the type name of this object
    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    /// Get the unique object ID
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current reference count
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Borrow the native payload if it has type `T`
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.inner.payload.as_ref()?.downcast_ref::<T>()
    }

    /// Check if this object carries a payload of type `T`
    pub fn has_payload<T: 'static>(&self) -> bool {
        self.payload::<T>().is_some()
    }

    /// Set an attribute on this object
    pub fn set_attr(&self, name: impl Into<SmolStr>, value: HostValue) {
        self.inner.attributes.borrow_mut().insert(name.into(), value);
    }

    /// Get an attribute from this object
    pub fn get_attr(&self, name: &str) -> Option<HostValue> {
        self.inner.attributes.borrow().get(name).cloned()
    }

    /// Check if object has an attribute
    pub fn has_attr(&self, name: &str) -> bool {
        self.inner.attributes.borrow().contains_key(name)
    }

    /// Get all attribute names, in insertion order
    pub fn attr_names(&self) -> Vec<SmolStr> {
        self.inner.attributes.borrow().keys().cloned().collect()
    }
}

impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object #{}>", self.inner.type_name, self.inner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_refcount() {
        let obj = HostObject::new("Buffer");
        assert_eq!(obj.ref_count(), 1);

        let alias = obj.clone();
        assert_eq!(obj.ref_count(), 2);
        assert_eq!(obj, alias);

        drop(alias);
        assert_eq!(obj.ref_count(), 1);
    }

    #[test]
    fn test_object_attributes() {
        let obj = HostObject::new("Config");
        obj.set_attr("rows", HostValue::Int(3));
        obj.set_attr("name", HostValue::Str("m".into()));

        assert!(obj.has_attr("rows"));
        assert!(matches!(obj.get_attr("rows"), Some(HostValue::Int(3))));
        assert_eq!(obj.attr_names(), vec![SmolStr::new("rows"), SmolStr::new("name")]);
    }

    #[test]
    fn test_object_payload() {
        let obj = HostObject::with_payload("Counter", Rc::new(41u32));
        assert_eq!(obj.payload::<u32>(), Some(&41));
        assert!(!obj.has_payload::<i64>());
        assert!(HostObject::new("Empty").payload::<u32>().is_none());
    }
}
