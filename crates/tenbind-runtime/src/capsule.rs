//! Capsules: host objects that own a native heap allocation.
//!
//! A capsule is the owner handle attached to arrays whose data lives inside
//! a native value that was moved onto the heap. The boxed value is dropped
//! exactly once, when the last host reference to the capsule goes away.
//!
//! Creation and release are counted per thread so callers can check that an
//! export allocated (and later freed) exactly what it should have.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use smol_str::SmolStr;

thread_local! {
    static CAPSULES_CREATED: Cell<usize> = const { Cell::new(0) };
    static CAPSULES_RELEASED: Cell<usize> = const { Cell::new(0) };
}

/// Capsule allocation statistics for the current thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapsuleStats {
    /// Capsules created so far
    pub created: usize,
    /// Capsules whose payload has been dropped
    pub released: usize,
}

impl CapsuleStats {
    /// Capsules currently alive
    pub fn live(&self) -> usize {
        self.created - self.released
    }

    /// Statistics accumulated since `earlier`
    pub fn since(&self, earlier: CapsuleStats) -> CapsuleStats {
        CapsuleStats {
            created: self.created - earlier.created,
            released: self.released - earlier.released,
        }
    }
}

/// Get the capsule statistics of the current thread
pub fn capsule_stats() -> CapsuleStats {
    CapsuleStats {
        created: CAPSULES_CREATED.with(Cell::get),
        released: CAPSULES_RELEASED.with(Cell::get),
    }
}

struct CapsuleInner {
    name: Option<SmolStr>,
    payload: Box<dyn Any>,
}

impl Drop for CapsuleInner {
    fn drop(&mut self) {
        CAPSULES_RELEASED.with(|released| released.set(released.get() + 1));
        tracing::trace!(name = ?self.name, "capsule released");
    }
}

/// Reference-counted owner of a boxed native value
#[derive(Clone)]
pub struct Capsule {
    inner: Rc<CapsuleInner>,
}

impl Capsule {
    /// Take ownership of an existing heap allocation.
    ///
    /// The box is not reallocated, so pointers into it taken before this
    /// call stay valid for as long as the capsule lives.
    pub fn new<T: 'static>(value: Box<T>) -> Self {
        Self::build(None, value)
    }

    /// Same as [`Capsule::new`] with a display name
    pub fn named<T: 'static>(name: impl Into<SmolStr>, value: Box<T>) -> Self {
        Self::build(Some(name.into()), value)
    }

    fn build(name: Option<SmolStr>, payload: Box<dyn Any>) -> Self {
        CAPSULES_CREATED.with(|created| created.set(created.get() + 1));
        Self {
            inner: Rc::new(CapsuleInner { name, payload }),
        }
    }

    /// Get the capsule name, if any
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Borrow the payload if it has type `T`
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.payload.downcast_ref::<T>()
    }

    /// Number of host references to this capsule
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Check if two handles refer to the same capsule
    pub fn ptr_eq(&self, other: &Capsule) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<capsule '{}'>", name),
            None => write!(f, "<capsule>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capsule_releases_once() {
        let before = capsule_stats();
        let capsule = Capsule::new(Box::new(vec![1u32, 2, 3]));
        let second = capsule.clone();
        assert_eq!(capsule.ref_count(), 2);

        drop(capsule);
        assert_eq!(capsule_stats().since(before).released, 0);

        drop(second);
        let delta = capsule_stats().since(before);
        assert_eq!(delta.created, 1);
        assert_eq!(delta.released, 1);
        assert_eq!(delta.live(), 0);
    }

    #[test]
    fn test_capsule_payload_pointer_is_stable() {
        let boxed = Box::new([7u64; 4]);
        let ptr = boxed.as_ptr();
        let capsule = Capsule::named("block", boxed);

        let payload = capsule.downcast_ref::<[u64; 4]>().unwrap();
        assert_eq!(payload.as_ptr(), ptr);
        assert_eq!(capsule.name(), Some("block"));
        assert!(capsule.downcast_ref::<u8>().is_none());
    }
}
