use rustix::io::Errno;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// the buffer had no free capacity before the call, rotate to a new one
    #[error("buffer is full")]
    BufferFull,
    /// the source reported zero bytes
    #[error("end of stream")]
    EndOfStream,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid range {start}..{stop} for length {len}")]
    InvalidRange {
        start: usize,
        stop: usize,
        len: usize,
    },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: isize, len: usize },
    #[error("empty needle")]
    EmptyNeedle,
    #[error("needle not found")]
    NotFound,
    /// pool buffers must hold at least one byte
    #[error("invalid pool buffer size {size}")]
    InvalidBufferSize { size: usize },
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::Io(errno.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
