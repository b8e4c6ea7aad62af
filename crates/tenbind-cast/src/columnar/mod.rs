//! Columnar Batch Caster
//!
//! Record types cross the boundary whole, as one `Arc` handle, through a
//! triple of host hooks: a predicate, a wrap function and an unwrap
//! function. The hooks are registered per Rust type in a
//! [`ColumnarRegistry`] at startup and handed to every
//! [`PassThroughCaster`].

pub mod batch;

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tenbind_runtime::HostValue;
use tenbind_tensor::Rejection;

use crate::error::{CastError, CastResult, ColumnarError};

pub use batch::{ColumnArray, DataType, Field, RecordBatch, Schema, Table};

/// Host hooks for one record type
pub struct PassThroughHooks<T> {
    /// Is this value a host object of the record type?
    pub check: fn(&HostValue) -> bool,
    /// Native handle to host object
    pub wrap: fn(Arc<T>) -> HostValue,
    /// Host object to native handle
    pub unwrap: fn(&HostValue) -> Option<Arc<T>>,
}

impl<T> Clone for PassThroughHooks<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PassThroughHooks<T> {}

impl<T> fmt::Debug for PassThroughHooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThroughHooks")
            .field("type", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// A record type with default host hooks
pub trait Columnar: Send + Sync + 'static {
    /// Display tag
    const TAG: &'static str;

    /// The default hooks
    fn hooks() -> PassThroughHooks<Self>
    where
        Self: Sized;
}

struct Entry {
    tag: SmolStr,
    hooks: Box<dyn Any>,
}

/// Hooks for every record type that may cross the boundary
#[derive(Default)]
pub struct ColumnarRegistry {
    entries: IndexMap<TypeId, Entry>,
}

impl ColumnarRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding [`RecordBatch`] and [`Table`]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert(RecordBatch::TAG.into(), RecordBatch::hooks());
        registry.insert(Table::TAG.into(), Table::hooks());
        registry
    }

    fn insert<T: 'static>(&mut self, tag: SmolStr, hooks: PassThroughHooks<T>) {
        tracing::debug!(%tag, ty = type_name::<T>(), "registered columnar hooks");
        self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                tag,
                hooks: Box::new(hooks),
            },
        );
    }

    /// Register the default hooks of `T`
    pub fn register<T: Columnar>(&mut self) -> Result<(), ColumnarError> {
        self.register_with(T::TAG, T::hooks())
    }

    /// Register hooks for `T` under `tag`; fails if `T` already has hooks
    pub fn register_with<T: 'static>(
        &mut self,
        tag: impl Into<SmolStr>,
        hooks: PassThroughHooks<T>,
    ) -> Result<(), ColumnarError> {
        if let Some(entry) = self.entries.get(&TypeId::of::<T>()) {
            return Err(ColumnarError::DuplicateRegistration {
                tag: entry.tag.clone(),
            });
        }
        self.insert(tag.into(), hooks);
        Ok(())
    }

    /// Get the hooks of `T`
    pub fn hooks<T: 'static>(&self) -> Result<PassThroughHooks<T>, ColumnarError> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.hooks.downcast_ref::<PassThroughHooks<T>>())
            .copied()
            .ok_or(ColumnarError::Unregistered {
                type_name: type_name::<T>(),
            })
    }

    /// Get the display tag of `T`
    pub fn tag<T: 'static>(&self) -> Option<&str> {
        self.entries.get(&TypeId::of::<T>()).map(|entry| entry.tag.as_str())
    }

    /// Check if `T` has hooks
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Registered tags, in registration order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.tag.as_str())
    }

    /// Number of registered record types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no record type is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ColumnarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tags()).finish()
    }
}

/// Passes one record type through unchanged
#[derive(Debug)]
pub struct PassThroughCaster<T> {
    tag: SmolStr,
    hooks: PassThroughHooks<T>,
    value: Option<Arc<T>>,
}

impl<T: 'static> PassThroughCaster<T> {
    /// Create a caster from the hooks registered for `T`.
    ///
    /// This lookup is the only fallible step of a columnar export.
    pub fn new(registry: &ColumnarRegistry) -> Result<Self, ColumnarError> {
        let hooks = registry.hooks::<T>()?;
        let tag = registry.tag::<T>().unwrap_or_default().into();
        Ok(Self {
            tag,
            hooks,
            value: None,
        })
    }

    /// Get the display name
    pub fn name(&self) -> &str {
        &self.tag
    }

    /// Try to take the handle out of `src`
    pub fn load(&mut self, src: &HostValue) -> CastResult<()> {
        self.value = None;
        let handle = if (self.hooks.check)(src) {
            (self.hooks.unwrap)(src)
        } else {
            None
        };

        match handle {
            Some(handle) => {
                self.value = Some(handle);
                Ok(())
            }
            None => {
                let rejection = Rejection::NotColumnar {
                    expected: self.tag.clone(),
                    actual: src.type_name().into(),
                };
                tracing::trace!(%rejection, "columnar import rejected");
                Err(rejection.into())
            }
        }
    }

    /// Get the loaded handle
    pub fn value(&self) -> Option<&Arc<T>> {
        self.value.as_ref()
    }

    /// Take the loaded handle
    pub fn into_value(self) -> CastResult<Arc<T>> {
        self.value.ok_or(CastError::NotLoaded)
    }

    /// Hand a shared handle to the host
    pub fn to_host(&self, value: &Arc<T>) -> HostValue {
        (self.hooks.wrap)(Arc::clone(value))
    }

    /// Hand a handle to the host
    pub fn into_host(&self, value: Arc<T>) -> HostValue {
        (self.hooks.wrap)(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenbind_runtime::HostObject;

    #[derive(Debug)]
    struct Points(Vec<(i64, i64)>);

    fn is_points(value: &HostValue) -> bool {
        value.as_object().is_some_and(|o| o.type_name() == "geo.Points")
    }

    fn wrap_points(points: Arc<Points>) -> HostValue {
        HostValue::Object(HostObject::with_payload("geo.Points", std::rc::Rc::new(points)))
    }

    fn unwrap_points(value: &HostValue) -> Option<Arc<Points>> {
        value.as_object()?.payload::<Arc<Points>>().cloned()
    }

    fn points_hooks() -> PassThroughHooks<Points> {
        PassThroughHooks {
            check: is_points,
            wrap: wrap_points,
            unwrap: unwrap_points,
        }
    }

    #[test]
    fn test_registration() {
        let mut registry = ColumnarRegistry::with_defaults();
        assert_eq!(registry.tags().collect::<Vec<_>>(), vec!["pyarrow.RecordBatch", "pyarrow.Table"]);

        let err = registry.register::<Table>().unwrap_err();
        assert_eq!(
            err,
            ColumnarError::DuplicateRegistration {
                tag: "pyarrow.Table".into()
            }
        );

        registry.register_with("geo.Points", points_hooks()).unwrap();
        assert_eq!(registry.tag::<Points>(), Some("geo.Points"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unregistered_type() {
        let registry = ColumnarRegistry::new();
        assert!(registry.is_empty());
        let err = PassThroughCaster::<Points>::new(&registry).unwrap_err();
        assert!(matches!(err, ColumnarError::Unregistered { .. }));
    }

    #[test]
    fn test_custom_hooks_pass_through() {
        let mut registry = ColumnarRegistry::new();
        registry.register_with("geo.Points", points_hooks()).unwrap();

        let points = Arc::new(Points(vec![(1, 2), (3, 4)]));
        let mut caster = PassThroughCaster::<Points>::new(&registry).unwrap();
        let host = caster.to_host(&points);

        caster.load(&host).unwrap();
        let back = caster.into_value().unwrap();
        assert!(Arc::ptr_eq(&back, &points));
        assert_eq!(back.0.len(), 2);
    }

    #[test]
    fn test_wrong_object_is_rejected() {
        let registry = ColumnarRegistry::with_defaults();
        let mut caster = PassThroughCaster::<RecordBatch>::new(&registry).unwrap();
        assert_eq!(caster.name(), "pyarrow.RecordBatch");

        let err = caster.load(&HostValue::Int(3)).unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&Rejection::NotColumnar {
                expected: "pyarrow.RecordBatch".into(),
                actual: "int".into(),
            })
        );
        assert!(caster.value().is_none());
    }
}
