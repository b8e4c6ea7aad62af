//! Per-call cast state: import flags, export policies and the cleanup list.

use std::cell::RefCell;
use std::fmt;

use tenbind_runtime::HostValue;

/// Flags controlling an import attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastFlags {
    /// Allow dtype and memory-order conversion through a temporary
    pub convert: bool,
}

impl CastFlags {
    /// Conversion allowed
    pub const CONVERT: CastFlags = CastFlags { convert: true };
    /// Exact matches only
    pub const NONE: CastFlags = CastFlags { convert: false };

    /// Same flags with conversion disabled
    pub fn without_convert(self) -> Self {
        CastFlags { convert: false }
    }
}

impl Default for CastFlags {
    fn default() -> Self {
        CastFlags::CONVERT
    }
}

/// How a native value is handed to the host on export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportPolicy {
    /// Let the caster decide (copy for owned data)
    #[default]
    Automatic,
    /// Like `Automatic`, but reference where a reference is possible
    AutomaticReference,
    /// Make an independent copy
    Copy,
    /// Steal the value's storage
    Move,
    /// Alias the native storage; the caller keeps it alive
    Reference,
    /// Alias the native storage and keep the parent object alive
    ReferenceInternal,
}

impl ExportPolicy {
    /// Get the policy name
    pub fn name(&self) -> &'static str {
        match self {
            ExportPolicy::Automatic => "automatic",
            ExportPolicy::AutomaticReference => "automatic_reference",
            ExportPolicy::Copy => "copy",
            ExportPolicy::Move => "move",
            ExportPolicy::Reference => "reference",
            ExportPolicy::ReferenceInternal => "reference_internal",
        }
    }

    /// Check if this policy aliases native storage
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ExportPolicy::Reference | ExportPolicy::ReferenceInternal
        )
    }
}

impl fmt::Display for ExportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Temporaries created during one call.
///
/// Conversion temporaries are kept here so that views bound to them stay
/// valid until the call returns. The list also carries the call's parent
/// (`self`) object, which `ReferenceInternal` exports keep alive.
#[derive(Debug, Default)]
pub struct CleanupList {
    parent: Option<HostValue>,
    temporaries: RefCell<Vec<HostValue>>,
}

impl CleanupList {
    /// Create an empty cleanup list without a parent
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cleanup list for a call on `parent`
    pub fn with_parent(parent: HostValue) -> Self {
        Self {
            parent: Some(parent),
            temporaries: RefCell::new(Vec::new()),
        }
    }

    /// Get the parent object
    pub fn parent(&self) -> Option<&HostValue> {
        self.parent.as_ref()
    }

    /// Keep `value` alive until the list is dropped
    pub fn keep(&self, value: HostValue) {
        self.temporaries.borrow_mut().push(value);
    }

    /// Get the number of temporaries held
    pub fn len(&self) -> usize {
        self.temporaries.borrow().len()
    }

    /// Check if no temporaries are held
    pub fn is_empty(&self) -> bool {
        self.temporaries.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenbind_runtime::HostObject;

    #[test]
    fn test_flags() {
        assert!(CastFlags::default().convert);
        assert_eq!(CastFlags::CONVERT.without_convert(), CastFlags::NONE);
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(ExportPolicy::default(), ExportPolicy::Automatic);
        assert_eq!(ExportPolicy::ReferenceInternal.to_string(), "reference_internal");
        assert!(ExportPolicy::Reference.is_reference());
        assert!(!ExportPolicy::AutomaticReference.is_reference());
    }

    #[test]
    fn test_cleanup_keeps_values_alive() {
        let obj = HostObject::new("tmp");
        let cleanup = CleanupList::with_parent(HostValue::None);
        cleanup.keep(HostValue::Object(obj.clone()));

        assert_eq!(cleanup.len(), 1);
        assert_eq!(obj.ref_count(), 2);
        assert!(cleanup.parent().is_some_and(HostValue::is_none));

        drop(cleanup);
        assert_eq!(obj.ref_count(), 1);
    }
}
