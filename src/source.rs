//! Where a record's bytes come from on a given tick.

use std::io::Read;
use std::marker::PhantomData;

use crate::presets::EditorPresets;

/// Producer-owned memory region holding one or more game structures.
///
/// The handle borrows the region for `'a`, so it cannot outlive a slice it
/// was built from:
///
/// ```compile_fail
/// use pitboard::LiveHandle;
///
/// let handle = {
///     let bytes = vec![0u8; 64];
///     LiveHandle::from_slice(&bytes)
/// };
/// assert_eq!(handle.size(), 64);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LiveHandle<'a> {
    addr: *const u8,
    size: usize,
    _region: PhantomData<&'a [u8]>,
}

impl<'a> LiveHandle<'a> {
    /// Wrap a producer buffer.
    ///
    /// # Safety
    ///
    /// `addr` must point to `size` readable bytes that stay mapped for as
    /// long as `'a`. Concurrent writes by the producer are tolerated (the
    /// copy is last-writer-wins), unmapping is not.
    pub unsafe fn new(addr: *const u8, size: usize) -> Self {
        Self { addr, size, _region: PhantomData }
    }

    /// Handle over a slice owned by the caller.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self { addr: bytes.as_ptr(), size: bytes.len(), _region: PhantomData }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        if self.addr.is_null() || self.size == 0 {
            return &[];
        }
        // SAFETY: `from_slice` borrows the region for 'a; `new` requires it.
        unsafe { std::slice::from_raw_parts(self.addr, self.size) }
    }
}

/// Source of one record update.
pub enum DataSource<'a> {
    /// Copy the producer's memory verbatim.
    Live(LiveHandle<'a>),
    /// Read exactly the record's byte length from a stream.
    Stream(&'a mut dyn Read),
    /// Editor mode: decode the bundled default payload, then apply presets.
    Preset(&'a EditorPresets),
}

impl<'a> DataSource<'a> {
    /// Editor presets when this update runs in editor mode.
    pub fn presets(&self) -> Option<&'a EditorPresets> {
        match self {
            DataSource::Preset(presets) => Some(*presets),
            _ => None,
        }
    }

    pub fn is_editor_mode(&self) -> bool {
        matches!(self, DataSource::Preset(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live(_) => "live",
            DataSource::Stream(_) => "stream",
            DataSource::Preset(_) => "preset",
        }
    }
}

impl std::fmt::Debug for DataSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live(handle) => f.debug_tuple("Live").field(handle).finish(),
            DataSource::Stream(_) => f.write_str("Stream(..)"),
            DataSource::Preset(_) => f.write_str("Preset(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_handle_reads_the_borrowed_bytes() {
        let bytes: Vec<u8> = (0..16).collect();
        let handle = LiveHandle::from_slice(&bytes);
        assert_eq!(handle.size(), 16);
        assert_eq!(handle.bytes(), &bytes[..]);

        let source = DataSource::Live(handle);
        assert_eq!(source.label(), "live");
        assert!(!source.is_editor_mode());
    }

    #[test]
    fn empty_and_null_handles_read_nothing() {
        assert!(LiveHandle::from_slice(&[]).bytes().is_empty());
        // SAFETY: a null handle is never dereferenced.
        let null = unsafe { LiveHandle::new(std::ptr::null(), 32) };
        assert!(null.bytes().is_empty());
    }
}
