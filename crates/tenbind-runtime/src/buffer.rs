//! Host-owned array storage.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::ptr::NonNull;

/// Alignment of every host buffer, enough for any dtype and for SIMD loads.
pub const BUFFER_ALIGN: usize = 64;

/// A zero-initialised, over-aligned heap allocation owned by a host array.
///
/// The buffer never hands out Rust references to its bytes; arrays read and
/// write through the raw pointer, so several arrays may view the same
/// buffer.
pub struct HostBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl HostBuffer {
    /// Allocate `nbytes` zeroed bytes.
    ///
    /// Zero-sized buffers still allocate one byte so the data pointer is
    /// always valid and unique.
    pub fn zeroed(nbytes: usize) -> Self {
        let layout = match Layout::from_size_align(nbytes.max(1), BUFFER_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("capacity overflow"),
        };

        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(ptr) => ptr,
            None => handle_alloc_error(layout),
        };

        Self { ptr, layout }
    }

    /// Allocate a buffer holding a copy of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let buffer = Self::zeroed(bytes.len());
        // SAFETY: the fresh allocation is at least bytes.len() long
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.ptr.as_ptr(), bytes.len());
        }
        buffer
    }

    /// Get the base pointer
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Get the base pointer as `NonNull`
    pub fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Get the usable size in bytes
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Check if empty (never true, zero-sized requests round up to one byte)
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }
}

impl Drop for HostBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `zeroed` with exactly this layout
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl fmt::Debug for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostBuffer({:p}, {} bytes)", self.ptr, self.layout.size())
    }
}
