use std::fmt;
use std::ops::{Add, Bound, RangeBounds};
use std::os::fd::AsFd;
use std::rc::Rc;

use crate::ascii::{self, WHITESPACE};
use crate::error::{Error, Result};
use crate::group::Group;
use crate::mapped_region::MappedRegion;
use crate::search::{Finder, RevFinder, find_in, rfind_in};
use crate::split::{Lines, Split};

/// Immutable window `[start, start + len)` into the written prefix of a
/// [`RawBuffer`].
///
/// The view holds its own reference to the backing memory, so the bytes stay
/// mapped for as long as the view (or any clone of it) exists, even if the
/// buffer itself was released.
///
/// [`RawBuffer`]: crate::RawBuffer
#[derive(Clone)]
pub struct View {
    region: Rc<MappedRegion>,
    start: usize,
    len: usize,
}

impl View {
    pub(crate) fn new(region: Rc<MappedRegion>, start: usize, len: usize) -> Self {
        debug_assert!(start + len <= region.len());
        Self { region, start, len }
    }

    /// A view over nothing, backed by no memory.
    pub fn empty() -> Self {
        Self::new(Rc::new(MappedRegion::empty()), 0, 0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // the buffer never writes below its cursor, which bounds every view
        unsafe { self.region.slice(self.start, self.len) }
    }

    /// address of the first byte, for identity checks
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, u8>> {
        self.as_slice().iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// true when both views borrow the same buffer memory
    pub fn shares_memory(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.region, &other.region)
    }

    /// true when `other` starts exactly where `self` ends in the same buffer
    pub fn is_adjacent(&self, other: &View) -> bool {
        self.shares_memory(other) && self.start + self.len == other.start
    }

    /// Single view covering `self` then `other`, if they are adjacent.
    pub fn merge(&self, other: &View) -> Option<View> {
        self.is_adjacent(other)
            .then(|| View::new(self.region.clone(), self.start, self.len + other.len))
    }

    /// Concatenates without copying: one view when adjacent, a group otherwise.
    pub fn concat(&self, other: &View) -> Joined {
        match self.merge(other) {
            Some(merged) => Joined::View(merged),
            None => Joined::Group(Group::from_views([self.clone(), other.clone()])),
        }
    }

    /// Byte at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<u8> {
        let at = resolve_index(index, self.len)?;
        Ok(self.as_slice()[at])
    }

    /// Sub-view over `range`, relative to this view.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<View> {
        let (start, stop) = resolve_range(range, self.len)?;
        Ok(self.sub(start, stop))
    }

    #[inline]
    pub(crate) fn sub(&self, start: usize, stop: usize) -> View {
        debug_assert!(start <= stop && stop <= self.len);
        View::new(self.region.clone(), self.start + start, stop - start)
    }

    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        self.find_in(needle, 0, self.len)
    }

    /// First occurrence of `needle` within `[start, stop)`; `stop` is clamped.
    pub fn find_in(&self, needle: &[u8], start: usize, stop: usize) -> Option<usize> {
        find_in(self.as_slice(), &Finder::new(needle), start, stop)
    }

    pub fn rfind(&self, needle: &[u8]) -> Option<usize> {
        self.rfind_in(needle, 0, self.len)
    }

    /// Last occurrence of `needle` within `[start, stop)`; `stop` is clamped.
    pub fn rfind_in(&self, needle: &[u8], start: usize, stop: usize) -> Option<usize> {
        rfind_in(self.as_slice(), &RevFinder::new(needle), start, stop)
    }

    pub fn index(&self, needle: &[u8]) -> Result<usize> {
        self.find(needle).ok_or(Error::NotFound)
    }

    pub fn rindex(&self, needle: &[u8]) -> Result<usize> {
        self.rfind(needle).ok_or(Error::NotFound)
    }

    pub fn contains(&self, needle: &[u8]) -> bool {
        self.find(needle).is_some()
    }

    /// Lazily splits on `sep`; `maxsplit` bounds the number of splits and the
    /// remainder is always yielded last.
    pub fn split<'n>(&self, sep: &'n [u8], maxsplit: Option<usize>) -> Result<Split<'n>> {
        if sep.is_empty() {
            return Err(Error::EmptyNeedle);
        }
        Ok(Split::new(self.clone(), Finder::new(sep), maxsplit))
    }

    /// Splits on `\n`, `\r\n` and lone `\r`.
    pub fn split_lines(&self, keep_ends: bool) -> Lines {
        Lines::new(self.clone(), keep_ends)
    }

    pub fn strip(&self, chars: Option<&[u8]>) -> View {
        self.strip_ends(chars, true, true)
    }

    pub fn lstrip(&self, chars: Option<&[u8]>) -> View {
        self.strip_ends(chars, true, false)
    }

    pub fn rstrip(&self, chars: Option<&[u8]>) -> View {
        self.strip_ends(chars, false, true)
    }

    fn strip_ends(&self, chars: Option<&[u8]>, left: bool, right: bool) -> View {
        let chars = chars.unwrap_or(WHITESPACE);
        let (lpos, rpos) = ascii::strip_bounds(self.as_slice(), chars, left, right);
        self.sub(lpos, rpos)
    }

    /// false for an empty view
    pub fn is_space(&self) -> bool {
        ascii::all_nonempty(self.as_slice(), ascii::is_space)
    }

    pub fn is_digit(&self) -> bool {
        ascii::all_nonempty(self.as_slice(), ascii::is_digit)
    }

    pub fn is_alpha(&self) -> bool {
        ascii::all_nonempty(self.as_slice(), ascii::is_alpha)
    }

    /// Writes the view with a single `write` call and returns the bytes written.
    pub fn write_to<Fd: AsFd>(&self, fd: Fd) -> Result<usize> {
        Ok(rustix::io::write(fd, self.as_slice())?)
    }

    #[inline]
    pub(crate) fn eq_bytes(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

pub(crate) fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let at = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index as usize)
    };
    match at {
        Some(at) if at < len => Ok(at),
        _ => Err(Error::IndexOutOfRange { index, len }),
    }
}

pub(crate) fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Result<(usize, usize)> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let stop = match range.end_bound() {
        Bound::Included(&s) => s.saturating_add(1),
        Bound::Excluded(&s) => s,
        Bound::Unbounded => len,
    };
    if stop < start || stop > len {
        return Err(Error::InvalidRange { start, stop, len });
    }
    Ok((start, stop))
}

impl AsRef<[u8]> for View {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View(b\"{}\")", self.as_slice().escape_ascii())
    }
}

impl PartialEq for View {
    fn eq(&self, other: &View) -> bool {
        self.len == other.len && self.as_slice() == other.as_slice()
    }
}

impl Eq for View {}

impl PartialEq<Group> for View {
    fn eq(&self, other: &Group) -> bool {
        other.eq_bytes(self.as_slice())
    }
}

impl_bytes_eq!(View);

impl Add for View {
    type Output = Joined;

    fn add(self, other: View) -> Joined {
        self.concat(&other)
    }
}

impl Add<Group> for View {
    type Output = Group;

    fn add(self, other: Group) -> Group {
        let mut group = Group::from_views([self]);
        group.extend(other);
        group
    }
}

/// Result of concatenating or slicing: a single view when the bytes are
/// contiguous in memory, a group otherwise.
#[derive(Clone, Debug, PartialEq)]
pub enum Joined {
    View(View),
    Group(Group),
}

impl Joined {
    pub fn len(&self) -> usize {
        match self {
            Joined::View(view) => view.len(),
            Joined::Group(group) => group.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Joined::View(view) => view.to_vec(),
            Joined::Group(group) => group.to_vec(),
        }
    }

    /// the segments in traversal order
    pub fn views(&self) -> &[View] {
        match self {
            Joined::View(view) => std::slice::from_ref(view),
            Joined::Group(group) => group.views(),
        }
    }

    pub fn into_group(self) -> Group {
        match self {
            Joined::View(view) => Group::from_views([view]),
            Joined::Group(group) => group,
        }
    }

    pub(crate) fn eq_bytes(&self, other: &[u8]) -> bool {
        match self {
            Joined::View(view) => view.eq_bytes(other),
            Joined::Group(group) => group.eq_bytes(other),
        }
    }
}

impl From<View> for Joined {
    fn from(view: View) -> Self {
        Joined::View(view)
    }
}

impl PartialEq<View> for Joined {
    fn eq(&self, other: &View) -> bool {
        self.eq_bytes(other.as_slice())
    }
}

impl_bytes_eq!(Joined);

#[cfg(test)]
mod test {
    use crate::{Error, Joined, RawBuffer};

    fn buffer(bytes: &[u8]) -> RawBuffer {
        RawBuffer::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_equality() {
        let buf = buffer(b"abc");
        assert_eq!(buf.view(), buf.view());
        assert_ne!(buf.view(), buf.view_range(0..2).unwrap());
        assert_ne!(buf.view_range(0..2).unwrap(), buf.view_range(1..3).unwrap());
        assert_eq!(buf.view(), b"abc");
        assert_ne!(buf.view(), b"abd");
        assert_ne!(buf.view(), b"ab");
        assert_eq!(buf.view(), b"abc".to_vec());
    }

    #[test]
    fn test_contains() {
        let view = buffer(b"abc").view();
        assert!(view.contains(b"a"));
        assert!(!view.contains(b"d"));
    }

    #[test]
    fn test_find_char() {
        let view = buffer(b"abc").view();
        assert_eq!(view.find(b"a"), Some(0));
        assert_eq!(view.find(b"c"), Some(2));
        assert_eq!(view.find(b"d"), None);
    }

    #[test]
    fn test_find_char_offsets() {
        let view = buffer(b"abcdefghijklm").view();
        assert_eq!(view.find_in(b"a", 1, view.len()), None);
        assert_eq!(view.find_in(b"c", 2, view.len()), Some(2));
        assert_eq!(view.find_in(b"d", 2, 4), Some(3));
        assert_eq!(view.find_in(b"e", 2, 3), None);
        assert_eq!(view.find_in(b"m", 0, 20), Some(12));
        assert_eq!(view.find_in(b"a", 3, 2), None);
    }

    #[test]
    fn test_find_empty_needle() {
        let view = buffer(b"abc").view();
        assert_eq!(view.find(b""), Some(0));
        assert_eq!(view.find_in(b"", 2, 3), Some(2));
        assert_eq!(RawBuffer::allocate(4).unwrap().view().rfind(b""), Some(0));
    }

    #[test]
    fn test_find_bytes() {
        let view = buffer(b"abc123").view();
        assert_eq!(view.find(b"23"), Some(4));
        assert_eq!(view.find(b"cc"), None);
        assert_eq!(view.find(b"c1"), Some(2));
    }

    #[test]
    fn test_rfind() {
        let view = buffer(b"abc123").view();
        assert_eq!(view.rfind(b"c"), Some(2));
        assert_eq!(view.rfind(b"3"), Some(5));
        assert_eq!(view.rfind(b"4"), None);
        assert_eq!(view.rfind_in(b"2", 0, 10), Some(4));
        assert_eq!(view.rfind_in(b"2", 10, 0), None);
        assert_eq!(buffer(b"123abc123").view().rfind(b"23"), Some(7));
    }

    #[test]
    fn test_index() {
        let view = buffer(b"abc123").view();
        assert_eq!(view.index(b"b").unwrap(), 1);
        assert!(matches!(view.index(b"d"), Err(Error::NotFound)));
        assert_eq!(view.rindex(b"c").unwrap(), 2);
        assert!(matches!(view.rindex(b"d"), Err(Error::NotFound)));
    }

    #[test]
    fn test_subscript() {
        let view = buffer(b"abc123").view();
        assert_eq!(view.get(0).unwrap(), b'a');
        assert_eq!(view.get(-1).unwrap(), b'3');
        assert_eq!(view.get(-6).unwrap(), b'a');
        assert!(matches!(view.get(7), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(view.get(-7), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_subscript_slice() {
        let view = buffer(b"abc123").view();
        assert_eq!(view.slice(..3).unwrap(), b"abc");
        assert_eq!(view.slice(3..).unwrap(), b"123");
        assert_eq!(view.slice(2..3).unwrap(), b"c");
        assert_eq!(view.slice(2..3).unwrap().slice(..).unwrap(), b"c");
        #[allow(clippy::reversed_empty_ranges)]
        let inverted = view.slice(3..2);
        assert!(matches!(inverted, Err(Error::InvalidRange { .. })));
        assert!(view.slice(0..7).is_err());
    }

    #[test]
    fn test_strip() {
        let view = buffer(b" \t\r\n\x0c\x0babc\t\r\n\x0c\x0b ").view();
        assert_eq!(view.strip(None), b"abc");
        assert_eq!(view.rstrip(None), b" \t\r\n\x0c\x0babc");
        assert_eq!(view.lstrip(None), b"abc\t\r\n\x0c\x0b ");

        let view = buffer(b"abc123").view();
        assert_eq!(view.strip(Some(b"ab3")), b"c12");
        assert_eq!(view.lstrip(Some(b"ab3")), b"c123");
        assert_eq!(view.rstrip(Some(b"ab3")), b"abc12");
    }

    #[test]
    fn test_classifiers() {
        let buf = buffer(b"a\t\r\n\x0c\x0b ");
        let view = buf.view();
        assert!(!view.slice(..1).unwrap().is_space());
        assert!(view.slice(1..).unwrap().is_space());
        assert!(!view.slice(0..0).unwrap().is_space());

        let buf = buffer(b"123abc");
        assert!(!buf.view().is_digit());
        assert!(buf.view_range(0..3).unwrap().is_digit());
        assert!(!buf.view_range(0..0).unwrap().is_digit());
        assert!(!buf.view().is_alpha());
        assert!(buf.view_range(3..6).unwrap().is_alpha());
        assert!(!buf.view_range(3..3).unwrap().is_alpha());
    }

    #[test]
    fn test_iteration() {
        let view = buffer(b"abc").view();
        assert_eq!(view.iter().collect::<Vec<_>>(), vec![b'a', b'b', b'c']);
    }

    #[test]
    fn test_add_contiguous() {
        let buf = buffer(b"abc123");
        let left = buf.view_range(0..3).unwrap();
        let joined = left.clone() + buf.view_range(3..6).unwrap();
        match joined {
            Joined::View(view) => {
                assert_eq!(view, buf.view());
                assert_eq!(view.as_ptr(), left.as_ptr());
            }
            Joined::Group(_) => panic!("adjacent views should merge"),
        }
    }

    #[test]
    fn test_add_discontiguous() {
        let buf = buffer(b"abc123");
        let joined = buf.view_range(0..2).unwrap() + buf.view_range(3..6).unwrap();
        assert!(matches!(joined, Joined::Group(_)));
        assert_eq!(joined, b"ab123");
        assert_eq!(joined.len(), 5);
    }

    #[test]
    fn test_debug() {
        let view = buffer(b"a\nb").view();
        assert_eq!(format!("{view:?}"), "View(b\"a\\nb\")");
    }
}
