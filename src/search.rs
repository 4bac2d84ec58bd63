//! Substring search over raw bytes.
//!
//! Single-byte needles go straight to `memchr`/`memrchr`. Longer needles use
//! Boyer-Moore-Horspool with a one-word bloom filter of the needle's bytes:
//! when the byte just past the current window is not in the filter, no match
//! can overlap it and the whole needle length is skipped.
//!
//! ```text
//! haystack: a a a a a a b
//! needle:   a a a b            last byte mismatch, next byte 'a' in filter
//!             a a a b          ...advance by the precomputed skip
//!                   a a a b    match at 3
//! ```

const BLOOM_WIDTH: u32 = usize::BITS;

#[inline(always)]
fn bloom_add(mask: usize, byte: u8) -> usize {
    mask | (1 << (byte as u32 & (BLOOM_WIDTH - 1)))
}

#[inline(always)]
fn bloom(mask: usize, byte: u8) -> bool {
    mask & (1 << (byte as u32 & (BLOOM_WIDTH - 1))) != 0
}

/// Forward searcher, built once per needle and reusable across haystacks.
#[derive(Clone, Debug)]
pub struct Finder<'n> {
    needle: &'n [u8],
    mask: usize,
    skip: usize,
}

impl<'n> Finder<'n> {
    pub fn new(needle: &'n [u8]) -> Self {
        let mut mask = 0;
        let mut skip = 0;
        if needle.len() > 1 {
            let mlast = needle.len() - 1;
            skip = mlast - 1;
            for (i, &byte) in needle[..mlast].iter().enumerate() {
                mask = bloom_add(mask, byte);
                if byte == needle[mlast] {
                    skip = mlast - i - 1;
                }
            }
            mask = bloom_add(mask, needle[mlast]);
        }
        Self { needle, mask, skip }
    }

    #[inline]
    pub fn needle(&self) -> &'n [u8] {
        self.needle
    }

    /// Offset of the first occurrence of the needle in `haystack`.
    ///
    /// An empty needle matches at 0.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        match self.needle {
            [] => Some(0),
            [byte] => memchr::memchr(*byte, haystack),
            _ => self.horspool(haystack),
        }
    }

    fn horspool(&self, haystack: &[u8]) -> Option<usize> {
        let n = haystack.len();
        let m = self.needle.len();
        if m > n {
            return None;
        }
        let mlast = m - 1;
        let last = self.needle[mlast];
        let w = n - m;
        let mut i = 0;
        while i <= w {
            if haystack[i + mlast] == last {
                if haystack[i..i + mlast] == self.needle[..mlast] {
                    return Some(i);
                }
                if i + m < n && !bloom(self.mask, haystack[i + m]) {
                    i += m;
                } else {
                    i += self.skip;
                }
            } else if i + m < n && !bloom(self.mask, haystack[i + m]) {
                i += m;
            }
            i += 1;
        }
        None
    }
}

/// Backward searcher, the mirror image of [`Finder`] keyed on the first byte.
#[derive(Clone, Debug)]
pub struct RevFinder<'n> {
    needle: &'n [u8],
    mask: usize,
    skip: usize,
}

impl<'n> RevFinder<'n> {
    pub fn new(needle: &'n [u8]) -> Self {
        let mut mask = 0;
        let mut skip = 0;
        if needle.len() > 1 {
            let mlast = needle.len() - 1;
            skip = mlast - 1;
            for i in (1..=mlast).rev() {
                mask = bloom_add(mask, needle[i]);
                if needle[i] == needle[0] {
                    skip = i - 1;
                }
            }
            mask = bloom_add(mask, needle[0]);
        }
        Self { needle, mask, skip }
    }

    #[inline]
    pub fn needle(&self) -> &'n [u8] {
        self.needle
    }

    /// Offset of the last occurrence of the needle in `haystack`.
    ///
    /// An empty needle matches at 0.
    pub fn rfind(&self, haystack: &[u8]) -> Option<usize> {
        match self.needle {
            [] => Some(0),
            [byte] => memchr::memrchr(*byte, haystack),
            _ => self.horspool(haystack),
        }
    }

    fn horspool(&self, haystack: &[u8]) -> Option<usize> {
        let n = haystack.len();
        let m = self.needle.len();
        if m > n {
            return None;
        }
        let first = self.needle[0];
        let mut i = (n - m) as isize;
        while i >= 0 {
            let at = i as usize;
            if haystack[at] == first {
                if haystack[at + 1..at + m] == self.needle[1..] {
                    return Some(at);
                }
                if at > 0 && !bloom(self.mask, haystack[at - 1]) {
                    i -= m as isize;
                } else {
                    i -= self.skip as isize;
                }
            } else if at > 0 && !bloom(self.mask, haystack[at - 1]) {
                i -= m as isize;
            }
            i -= 1;
        }
        None
    }
}

/// `find` restricted to `haystack[start..stop]`, offsets relative to `haystack`.
///
/// `stop` is clamped to the haystack length; an inverted window finds nothing,
/// and an empty needle is found at `start`.
pub(crate) fn find_in(
    haystack: &[u8],
    finder: &Finder<'_>,
    start: usize,
    stop: usize,
) -> Option<usize> {
    let stop = stop.min(haystack.len());
    if start > stop {
        return None;
    }
    finder.find(&haystack[start..stop]).map(|pos| start + pos)
}

/// `rfind` counterpart of [`find_in`]; an empty needle is found at `start` too.
pub(crate) fn rfind_in(
    haystack: &[u8],
    finder: &RevFinder<'_>,
    start: usize,
    stop: usize,
) -> Option<usize> {
    let stop = stop.min(haystack.len());
    if start > stop {
        return None;
    }
    if finder.needle().is_empty() {
        return Some(start);
    }
    finder.rfind(&haystack[start..stop]).map(|pos| start + pos)
}
