//! Cast configuration.

use tenbind_tensor::{CastFlags, ExportPolicy};

/// Configuration applied by a [`Converter`](crate::Converter)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastConfig {
    /// Allow implicit dtype and memory-order conversion on import
    pub convert: bool,
    /// Export policy for return values
    pub return_policy: ExportPolicy,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            convert: true,
            return_policy: ExportPolicy::Automatic,
        }
    }
}

impl CastConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow or forbid implicit conversion on import.
    pub fn with_convert(mut self, convert: bool) -> Self {
        self.convert = convert;
        self
    }

    /// Set the export policy for return values.
    pub fn with_return_policy(mut self, policy: ExportPolicy) -> Self {
        self.return_policy = policy;
        self
    }

    /// Import flags for this configuration
    pub fn flags(&self) -> CastFlags {
        CastFlags {
            convert: self.convert,
        }
    }
}
