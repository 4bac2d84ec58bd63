use std::ptr::NonNull;

use rustix::mm::{MapFlags, ProtFlags, mmap_anonymous, munmap};

/// Anonymous private mapping backing one `RawBuffer`.
///
/// A zero-length region maps nothing and hands out a dangling pointer.
pub(crate) struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        unsafe {
            let _ = munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}

impl MappedRegion {
    pub(crate) fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    pub(crate) fn build(len: usize) -> std::io::Result<Self> {
        if len == 0 {
            return Ok(Self::empty());
        }
        let ptr = Self::map(len)?;
        Ok(Self { ptr, len })
    }

    fn map(len: usize) -> std::io::Result<NonNull<u8>> {
        let mapped = unsafe {
            mmap_anonymous(
                core::ptr::null_mut(),
                len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::PRIVATE | MapFlags::POPULATE,
            )
        }?;
        // mmap reports failure through Errno, never through a null mapping
        Ok(unsafe { NonNull::new_unchecked(mapped) }.cast())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Bytes `[start, start + len)` of the mapping.
    ///
    /// # Safety
    /// The range must lie inside the mapping and no writer may touch it while
    /// the returned slice is alive.
    #[inline]
    pub(crate) unsafe fn slice(&self, start: usize, len: usize) -> &[u8] {
        debug_assert!(start + len <= self.len);
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr().add(start), len) }
    }

    /// Bytes `[start, len)` of the mapping, for writing.
    ///
    /// # Safety
    /// No reader may observe the range while the returned slice is alive.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn tail_mut(&self, start: usize) -> &mut [u8] {
        debug_assert!(start <= self.len);
        unsafe {
            core::slice::from_raw_parts_mut(self.ptr.as_ptr().add(start), self.len - start)
        }
    }
}
