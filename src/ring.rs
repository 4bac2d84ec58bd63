use std::io;
use std::os::fd::{AsFd, AsRawFd};

use io_uring::{IoUring, opcode, types::Fd};

use crate::buffer::RawBuffer;
use crate::error::{Error, Result};

const READ_USER_DATA: u64 = 0x7262;

/// Blocking reads submitted through an io_uring.
///
/// One read is in flight at a time: each call pushes a single entry and waits
/// for its completion, so the ring must not be shared with other submitters.
pub struct UringReader {
    ring: IoUring,
}

impl UringReader {
    pub fn new(entries: u32) -> Result<Self> {
        Ok(Self {
            ring: IoUring::new(entries)?,
        })
    }

    /// Same contract as [`RawBuffer::read_from`]: fills the free tail of `buf`
    /// from the current position of `fd`.
    pub fn read_into<F: AsFd>(&mut self, buf: &mut RawBuffer, fd: F) -> Result<usize> {
        if buf.is_full() {
            return Err(Error::BufferFull);
        }
        let spare = buf.spare_mut();
        let len = spare.len().min(u32::MAX as usize) as u32;
        // offset -1 reads from (and advances) the file position
        let entry = opcode::Read::new(Fd(fd.as_fd().as_raw_fd()), spare.as_mut_ptr(), len)
            .offset(u64::MAX)
            .build()
            .user_data(READ_USER_DATA);

        unsafe {
            self.ring
                .submission()
                .push(&entry)
                .map_err(|_| io::Error::other("submission queue is full"))?;
        }
        let res = self.wait_for_read()?;
        if res < 0 {
            return Err(io::Error::from_raw_os_error(-res).into());
        }
        buf.commit(res as usize)
    }

    /// Blocks until the pushed read completes and returns its result.
    ///
    /// The kernel may still be writing into the buffer until the read's
    /// completion is reaped, so interrupted waits are retried rather than
    /// returned. Completions for other entries are discarded.
    fn wait_for_read(&mut self) -> io::Result<i32> {
        loop {
            match self.ring.submit_and_wait(1) {
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
            let read = self
                .ring
                .completion()
                .find(|cqe| cqe.user_data() == READ_USER_DATA);
            if let Some(cqe) = read {
                return Ok(cqe.result());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::fs::{self, File};

    use io_uring::opcode;

    use super::UringReader;
    use crate::{Error, RawBuffer};

    #[test]
    fn test_foreign_completions_are_skipped() {
        let Ok(mut reader) = UringReader::new(8) else {
            // io_uring unavailable in this environment
            return;
        };
        let nop = opcode::Nop::new().build().user_data(1);
        unsafe {
            reader.ring.submission().push(&nop).unwrap();
        }
        reader.ring.submit_and_wait(1).unwrap();
        assert_eq!(reader.ring.completion().len(), 1);

        let name = format!("zero_buffer_ring_{}", rand::random::<u64>());
        let path = std::env::temp_dir().join(name);
        fs::write(&path, b"abc123").unwrap();
        let file = File::open(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let mut buf = RawBuffer::allocate(16).unwrap();
        assert_eq!(reader.read_into(&mut buf, &file).unwrap(), 6);
        assert_eq!(buf.view(), b"abc123");
        assert!(matches!(reader.read_into(&mut buf, &file), Err(Error::EndOfStream)));
        assert!(reader.ring.completion().is_empty());
    }
}
