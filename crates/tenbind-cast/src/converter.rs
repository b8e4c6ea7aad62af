//! Per-call conversion context.
//!
//! A [`Converter`] stands for one call across the boundary: it owns the
//! cleanup list that keeps conversion temporaries alive until the call
//! ends, optionally knows the parent object whose method is being called,
//! and applies a [`CastConfig`] to every argument and return value.

use std::sync::Arc;

use tenbind_runtime::HostValue;
use tenbind_tensor::{CastFlags, CleanupList, ExportPolicy};

use crate::caster::{self, FromHost, IntoHost, ToHost, ToHostRef};
use crate::columnar::{Columnar, ColumnarRegistry, PassThroughCaster};
use crate::config::CastConfig;
use crate::error::CastResult;

/// Applies a [`CastConfig`] to the arguments and results of one call
#[derive(Debug, Default)]
pub struct Converter {
    config: CastConfig,
    cleanup: CleanupList,
}

impl Converter {
    /// Create a converter for a free function call
    pub fn new(config: CastConfig) -> Self {
        Self {
            config,
            cleanup: CleanupList::new(),
        }
    }

    /// Create a converter for a method call on `parent`
    pub fn with_parent(config: CastConfig, parent: HostValue) -> Self {
        Self {
            config,
            cleanup: CleanupList::with_parent(parent),
        }
    }

    /// Get the configuration applied to this call
    pub fn config(&self) -> &CastConfig {
        &self.config
    }

    /// Get the temporaries kept alive until the call ends
    pub fn cleanup(&self) -> &CleanupList {
        &self.cleanup
    }

    /// Get the object whose method is being called, if any
    pub fn parent(&self) -> Option<&HostValue> {
        self.cleanup.parent()
    }

    /// Import an argument with the configured flags
    pub fn load<'a, T: FromHost<'a>>(&'a self, src: &'a HostValue) -> CastResult<T> {
        self.load_with(src, self.config.flags())
    }

    /// Import an argument with explicit flags
    pub fn load_with<'a, T: FromHost<'a>>(
        &'a self,
        src: &'a HostValue,
        flags: CastFlags,
    ) -> CastResult<T> {
        caster::load(src, flags, &self.cleanup)
    }

    /// Export a return value with the configured policy
    pub fn export<T: IntoHost>(&self, value: T) -> HostValue {
        self.export_with(value, self.config.return_policy)
    }

    /// Export a return value with an explicit policy
    pub fn export_with<T: IntoHost>(&self, value: T, policy: ExportPolicy) -> HostValue {
        let out = value.into_host(policy, &self.cleanup);
        self.attach(out, policy)
    }

    /// Export a borrowed return value with the configured policy
    pub fn export_ref<T: ToHost + ?Sized>(&self, value: &T) -> HostValue {
        self.export_ref_with(value, self.config.return_policy)
    }

    /// Export a borrowed return value with an explicit policy
    pub fn export_ref_with<T: ToHost + ?Sized>(&self, value: &T, policy: ExportPolicy) -> HostValue {
        let out = value.to_host(policy, &self.cleanup);
        self.attach(out, policy)
    }

    /// Export a borrowed return value with the configured policy, aliasing
    /// its storage where the policy allows.
    ///
    /// # Safety
    ///
    /// Same contract as [`ToHostRef::to_host_ref`].
    pub unsafe fn export_alias<T: ToHostRef + ?Sized>(&self, value: &T) -> HostValue {
        // SAFETY: forwarded from the caller
        unsafe { self.export_alias_with(value, self.config.return_policy) }
    }

    /// Export a borrowed return value with an explicit policy, aliasing
    /// its storage where the policy allows.
    ///
    /// # Safety
    ///
    /// Same contract as [`ToHostRef::to_host_ref`].
    pub unsafe fn export_alias_with<T: ToHostRef + ?Sized>(
        &self,
        value: &T,
        policy: ExportPolicy,
    ) -> HostValue {
        // SAFETY: forwarded from the caller
        let out = unsafe { value.to_host_ref(policy, &self.cleanup) };
        self.attach(out, policy)
    }

    /// Import a columnar record handle.
    ///
    /// # Errors
    ///
    /// Fails if `T` has no hooks in `registry` or `src` isn't a `T`.
    pub fn load_columnar<T: Columnar>(
        &self,
        registry: &ColumnarRegistry,
        src: &HostValue,
    ) -> CastResult<Arc<T>> {
        let mut caster = PassThroughCaster::<T>::new(registry)?;
        caster.load(src)?;
        caster.into_value()
    }

    /// Export a columnar record handle through a resolved caster
    pub fn export_columnar<T: Columnar>(
        &self,
        caster: &PassThroughCaster<T>,
        value: Arc<T>,
    ) -> HostValue {
        caster.into_host(value)
    }

    /// Tie the lifetime of the parent to an exported array
    fn attach(&self, out: HostValue, policy: ExportPolicy) -> HostValue {
        if policy != ExportPolicy::ReferenceInternal {
            return out;
        }

        if let (Some(parent), Some(array)) = (self.cleanup.parent(), out.as_array()) {
            let already_based = array.base().is_some_and(|base| base.is(parent));
            if !already_based {
                tracing::debug!(parent = %parent.type_name(), array = array.id(), "keeping parent alive");
                array.keep_alive(parent.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tenbind_dense::{Map, MatrixX, Vector3};
    use tenbind_runtime::{HostObject, NdArray};

    #[test]
    fn test_configured_flags() {
        let array = NdArray::from_vec(vec![1i32, 2, 3], &[3]).unwrap();
        let src = HostValue::Array(array);

        let strict = Converter::new(CastConfig::new().with_convert(false));
        assert!(strict.load::<Vector3<f64>>(&src).is_err());

        let lenient = Converter::new(CastConfig::new());
        let v: Vector3<f64> = lenient.load(&src).unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(lenient.cleanup().len(), 1);
    }

    #[test]
    fn test_reference_internal_keeps_parent_alive() {
        let parent = HostValue::Object(HostObject::new("Buffer"));
        let converter = Converter::with_parent(
            CastConfig::new().with_return_policy(ExportPolicy::ReferenceInternal),
            parent.clone(),
        );
        assert!(converter.parent().is_some_and(|p| p.is(&parent)));
        assert_eq!(converter.config().return_policy, ExportPolicy::ReferenceInternal);

        let mut storage = vec![0.5f32; 6];
        let map = Map::<MatrixX<f32>>::from_slice_mut(&mut storage, 2, 3).unwrap();
        // SAFETY: `storage` outlives `out`
        let out = unsafe { converter.export_alias(&map) };

        let array = out.as_array().unwrap();
        assert_eq!(array.kept_alive().len(), 1);
        assert!(array.kept_alive()[0].is(&parent));
        assert_eq!(parent.ref_count(), Some(3));
    }

    #[test]
    fn test_no_keep_alive_when_parent_is_base() {
        let parent = HostValue::Object(HostObject::new("Holder"));
        let converter = Converter::with_parent(CastConfig::new(), parent);

        let m = MatrixX::<u8>::zeros(2, 2).unwrap();
        // SAFETY: `m` outlives `out` and isn't written to
        let out = unsafe { converter.export_alias_with(&m, ExportPolicy::ReferenceInternal) };
        let array = out.as_array().unwrap();
        assert!(array.base().is_some());
        assert!(array.kept_alive().is_empty());
        assert!(!array.is_writeable());
    }
}
