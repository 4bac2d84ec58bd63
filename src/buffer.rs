use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::os::fd::AsFd;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::mapped_region::MappedRegion;
use crate::view::View;

/// Fixed-capacity memory region with a write cursor.
///
/// Bytes below the cursor are immutable: views alias them, writes only ever land
/// in the free tail. The cursor goes back to 0 only when a [`BufferPool`] takes
/// the buffer back and nothing else holds its memory.
///
/// [`BufferPool`]: crate::BufferPool
pub struct RawBuffer {
    region: Rc<MappedRegion>,
    write_pos: usize,
}

impl RawBuffer {
    /// Maps a standalone buffer of `capacity` bytes, outside of any pool.
    pub fn allocate(capacity: usize) -> Result<Self> {
        let region = MappedRegion::build(capacity)?;
        Ok(Self {
            region: Rc::new(region),
            write_pos: 0,
        })
    }

    /// Standalone buffer holding a copy of `bytes`, with no free capacity left.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = Self::allocate(bytes.len())?;
        if !bytes.is_empty() {
            buf.append(bytes)?;
        }
        Ok(buf)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    #[inline]
    pub fn free(&self) -> usize {
        self.capacity() - self.write_pos
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// start of the backing memory, stable for the lifetime of the buffer
    pub fn as_ptr(&self) -> *const u8 {
        self.region.as_ptr()
    }

    /// Reads once from `fd` into the free tail and returns the byte count.
    pub fn read_from<Fd: AsFd>(&mut self, fd: Fd) -> Result<usize> {
        if self.is_full() {
            return Err(Error::BufferFull);
        }
        let read = rustix::io::read(fd, self.spare_mut())?;
        self.commit(read)
    }

    /// Copies as much of `bytes` as fits; a short count means the caller must
    /// rotate to a new buffer for the remainder.
    pub fn append(&mut self, bytes: &[u8]) -> Result<usize> {
        if self.is_full() {
            return Err(Error::BufferFull);
        }
        let written = bytes.len().min(self.free());
        self.spare_mut()[..written].copy_from_slice(&bytes[..written]);
        self.write_pos += written;
        Ok(written)
    }

    /// View over everything written so far.
    pub fn view(&self) -> View {
        View::new(self.region.clone(), 0, self.write_pos)
    }

    /// View over `range` of the written prefix.
    pub fn view_range<R: RangeBounds<usize>>(&self, range: R) -> Result<View> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&s) => s.saturating_add(1),
            Bound::Excluded(&s) => s,
            Bound::Unbounded => self.write_pos,
        };
        if stop < start || start > self.write_pos || stop > self.write_pos {
            return Err(Error::InvalidRange {
                start,
                stop,
                len: self.write_pos,
            });
        }
        Ok(View::new(self.region.clone(), start, stop - start))
    }

    /// unwritten tail of the buffer
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        // views only ever cover [0, write_pos)
        unsafe { self.region.tail_mut(self.write_pos) }
    }

    /// Accounts for `read` bytes landed in the tail by an external reader.
    pub(crate) fn commit(&mut self, read: usize) -> Result<usize> {
        if read == 0 {
            return Err(Error::EndOfStream);
        }
        debug_assert!(read <= self.free());
        self.write_pos += read;
        Ok(read)
    }

    /// true while a view still borrows the backing memory
    pub(crate) fn is_shared(&self) -> bool {
        Rc::strong_count(&self.region) > 1
    }

    pub(crate) fn reset(&mut self) {
        debug_assert!(!self.is_shared());
        self.write_pos = 0;
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("capacity", &self.capacity())
            .field("write_pos", &self.write_pos)
            .field("free", &self.free())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use crate::{Error, RawBuffer};

    #[test]
    fn test_append() {
        let mut buf = RawBuffer::allocate(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.append(b"abc").unwrap(), 3);
        assert_eq!(buf.write_pos(), 3);
        assert_eq!(buf.free(), 13);
        assert_eq!(buf.capacity(), 16);
    }

    #[test]
    fn test_append_longer_than_buffer() {
        let mut buf = RawBuffer::allocate(16).unwrap();
        assert_eq!(buf.append(&[b'a'; 20]).unwrap(), 16);
        assert_eq!(buf.write_pos(), 16);
        assert!(buf.is_full());
        assert!(matches!(buf.append(b"abc"), Err(Error::BufferFull)));
    }

    #[test]
    fn test_view() {
        let mut buf = RawBuffer::allocate(16).unwrap();
        buf.append(b"abc").unwrap();
        assert_eq!(buf.view(), b"abc");
        assert_eq!(buf.view_range(0..3).unwrap(), b"abc");
        assert_eq!(buf.view_range(1..).unwrap(), b"bc");
        assert_eq!(buf.view_range(..=1).unwrap(), b"ab");
        assert_eq!(buf.view_range(3..3).unwrap().len(), 0);
    }

    #[test]
    fn test_invalid_views() {
        let mut buf = RawBuffer::allocate(16).unwrap();
        buf.append(b"abc123").unwrap();
        let ranges = [(3, 0), (10, 11), (0, 11), (7, 7)];
        for (start, stop) in ranges {
            assert!(
                matches!(buf.view_range(start..stop), Err(Error::InvalidRange { .. })),
                "{start}..{stop}"
            );
        }
    }

    #[test]
    fn test_views_survive_later_writes() {
        let mut buf = RawBuffer::allocate(8).unwrap();
        buf.append(b"abcd").unwrap();
        let view = buf.view();
        buf.append(b"efgh").unwrap();
        assert_eq!(view, b"abcd");
        assert_eq!(buf.view(), b"abcdefgh");
    }

    #[test]
    fn test_from_bytes() {
        let buf = RawBuffer::from_bytes(b"abc123").unwrap();
        assert_eq!(buf.capacity(), 6);
        assert!(buf.is_full());
        assert_eq!(buf.view(), b"abc123");

        let empty = RawBuffer::from_bytes(b"").unwrap();
        assert_eq!(empty.capacity(), 0);
        assert!(empty.view().is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let buf = RawBuffer::allocate(0).unwrap();
        assert!(buf.is_full());
        assert!(buf.view().is_empty());
    }
}
