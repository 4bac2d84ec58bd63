use tracing::{debug, trace};

use crate::buffer::RawBuffer;
use crate::error::{Error, Result};

/// Sizing of a [`BufferPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// number of released buffers kept for reuse
    pub capacity: usize,
    /// bytes per buffer
    pub buffer_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            buffer_size: 8192,
        }
    }
}

impl PoolConfig {
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

/// Bounded free-list of [`RawBuffer`]s.
///
/// The capacity bounds recycling, not the number of buffers in flight:
/// `acquire` maps a fresh buffer whenever the list is empty.
#[derive(Debug)]
pub struct BufferPool {
    config: PoolConfig,
    free_list: Vec<RawBuffer>,
}

impl BufferPool {
    /// Builds the pool and maps its first `capacity` buffers up front.
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.buffer_size == 0 {
            return Err(Error::InvalidBufferSize {
                size: config.buffer_size,
            });
        }
        let free_list = (0..config.capacity)
            .map(|_| RawBuffer::allocate(config.buffer_size))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { config, free_list })
    }

    pub fn with_capacity(capacity: usize, buffer_size: usize) -> Result<Self> {
        Self::new(PoolConfig {
            capacity,
            buffer_size,
        })
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// buffers currently waiting for reuse
    pub fn available(&self) -> usize {
        self.free_list.len()
    }

    pub fn acquire(&mut self) -> Result<RawBuffer> {
        if let Some(buf) = self.free_list.pop() {
            return Ok(buf);
        }
        debug!(
            buffer_size = self.config.buffer_size,
            "free list empty, mapping a fresh buffer"
        );
        RawBuffer::allocate(self.config.buffer_size)
    }

    /// Gives `buf` back to the pool.
    ///
    /// The buffer is recycled only when nothing else holds its memory and the
    /// free list has room. A buffer still borrowed by views is dropped here and
    /// its memory goes away with the last view.
    pub fn release(&mut self, mut buf: RawBuffer) {
        if buf.is_shared() {
            debug!(
                capacity = buf.capacity(),
                "released buffer still borrowed by views, not recycled"
            );
            return;
        }
        if self.free_list.len() >= self.config.capacity {
            debug!(
                capacity = self.config.capacity,
                "free list full, dropping released buffer"
            );
            return;
        }
        if buf.capacity() != self.config.buffer_size {
            debug!(
                capacity = buf.capacity(),
                expected = self.config.buffer_size,
                "released buffer has a foreign size, not recycled"
            );
            return;
        }
        buf.reset();
        self.free_list.push(buf);
        trace!(available = self.free_list.len(), "buffer recycled");
    }
}

#[cfg(test)]
mod test {
    use crate::{BufferPool, Error, PoolConfig};

    #[test]
    fn test_round_trip_returns_same_buffer() {
        let mut pool = BufferPool::with_capacity(1, 16).unwrap();
        let buf = pool.acquire().unwrap();
        let ptr = buf.as_ptr();
        pool.release(buf);
        let buf = pool.acquire().unwrap();
        assert_eq!(buf.as_ptr(), ptr);
        assert_eq!(buf.write_pos(), 0);
    }

    #[test]
    fn test_release_resets_cursor() {
        let mut pool = BufferPool::with_capacity(1, 16).unwrap();
        let mut buf = pool.acquire().unwrap();
        buf.append(b"abc").unwrap();
        assert_eq!(buf.write_pos(), 3);
        pool.release(buf);
        let buf = pool.acquire().unwrap();
        assert_eq!(buf.write_pos(), 0);
    }

    #[test]
    fn test_acquire_allocates_when_empty() {
        let mut pool = BufferPool::with_capacity(1, 16).unwrap();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(b.capacity(), 16);
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_borrowed_buffer_not_recycled() {
        let mut pool = BufferPool::with_capacity(1, 16).unwrap();
        let mut buf = pool.acquire().unwrap();
        buf.append(b"abc").unwrap();
        let view = buf.view();
        pool.release(buf);
        assert_eq!(pool.available(), 0);

        let mut next = pool.acquire().unwrap();
        next.append(b"xyz").unwrap();
        assert_eq!(view, b"abc");
    }

    #[test]
    fn test_config() {
        let config = PoolConfig::default().capacity(2).buffer_size(32);
        let pool = BufferPool::new(config).unwrap();
        assert_eq!(pool.config(), config);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let err = BufferPool::with_capacity(2, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidBufferSize { size: 0 }));
        assert_eq!(err.to_string(), "invalid pool buffer size 0");
    }
}
