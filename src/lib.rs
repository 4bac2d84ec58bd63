//! Zero-copy staging buffers for line and record oriented reads.
//!
//! Bytes are read from a file descriptor into pooled, fixed-capacity
//! [`RawBuffer`]s. [`View`]s borrow ranges of that memory without copying,
//! [`Group`]s chain views that are logically adjacent but live apart, and a
//! [`Collator`] stitches records that straddle buffers back into one view,
//! copying only when the pieces are not already contiguous.
//!
//! Everything here is single-threaded: views share their buffer's memory
//! through `Rc`, so none of these types are `Send` or `Sync`.

macro_rules! impl_bytes_eq {
    ($ty:ty) => {
        impl PartialEq<[u8]> for $ty {
            fn eq(&self, other: &[u8]) -> bool {
                self.eq_bytes(other)
            }
        }

        impl PartialEq<&[u8]> for $ty {
            fn eq(&self, other: &&[u8]) -> bool {
                self.eq_bytes(other)
            }
        }

        impl<const N: usize> PartialEq<[u8; N]> for $ty {
            fn eq(&self, other: &[u8; N]) -> bool {
                self.eq_bytes(other)
            }
        }

        impl<const N: usize> PartialEq<&[u8; N]> for $ty {
            fn eq(&self, other: &&[u8; N]) -> bool {
                self.eq_bytes(*other)
            }
        }

        impl PartialEq<Vec<u8>> for $ty {
            fn eq(&self, other: &Vec<u8>) -> bool {
                self.eq_bytes(other)
            }
        }
    };
}

mod ascii;
mod buffer;
mod buffer_pool;
mod collator;
mod error;
mod group;
mod mapped_region;
mod ring;
mod search;
mod split;
mod view;

pub use ascii::WHITESPACE;
pub use buffer::RawBuffer;
pub use buffer_pool::{BufferPool, PoolConfig};
pub use collator::Collator;
pub use error::{Error, Result};
pub use group::Group;
pub use ring::UringReader;
pub use search::{Finder, RevFinder};
pub use split::{Lines, Split};
pub use view::{Joined, View};
