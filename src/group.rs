use std::fmt;
use std::io::IoSlice;
use std::ops::{Add, RangeBounds};
use std::os::fd::AsFd;

use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::search::{Finder, RevFinder};
use crate::view::{Joined, View, resolve_index, resolve_range};

/// Ordered views read as one logical byte sequence.
///
/// Neighbouring views may live in unrelated memory; that is the point of a
/// group. Empty views are never stored and adjacent ones are merged on push, so
/// a group stays a handful of segments and index lookups walk them linearly.
#[derive(Clone, Default)]
pub struct Group {
    views: SmallVec<[View; 4]>,
    len: usize,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_views<I: IntoIterator<Item = View>>(views: I) -> Self {
        let mut group = Self::new();
        group.extend(views);
        group
    }

    pub fn push(&mut self, view: View) {
        if view.is_empty() {
            return;
        }
        self.len += view.len();
        if let Some(last) = self.views.last_mut() {
            if let Some(merged) = last.merge(&view) {
                *last = merged;
                return;
            }
        }
        self.views.push(view);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.views.iter().flat_map(View::iter)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for view in &self.views {
            out.extend_from_slice(view.as_slice());
        }
        out
    }

    /// (view index, offset inside that view) holding byte `at`
    fn locate(&self, mut at: usize) -> Option<(usize, usize)> {
        for (idx, view) in self.views.iter().enumerate() {
            if at < view.len() {
                return Some((idx, at));
            }
            at -= view.len();
        }
        None
    }

    /// Byte at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<u8> {
        let at = resolve_index(index, self.len)?;
        let (idx, offset) = self
            .locate(at)
            .ok_or(Error::IndexOutOfRange { index, len: self.len })?;
        Ok(self.views[idx].as_slice()[offset])
    }

    /// Sub-sequence over `range`; collapses to a single view when the range
    /// falls inside one segment.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Joined> {
        let (start, stop) = resolve_range(range, self.len)?;
        Ok(self.sub(start, stop))
    }

    pub(crate) fn sub(&self, start: usize, stop: usize) -> Joined {
        let mut pieces = Group::new();
        let mut offset = 0;
        for view in &self.views {
            let end = offset + view.len();
            if end > start && offset < stop {
                let lo = start.saturating_sub(offset);
                let hi = stop.min(end) - offset;
                pieces.push(view.sub(lo, hi));
            }
            if end >= stop {
                break;
            }
            offset = end;
        }
        if pieces.views.len() == 1 {
            if let Some(view) = pieces.views.pop() {
                return Joined::View(view);
            }
        }
        Joined::Group(pieces)
    }

    /// Copies bytes `[lo, hi)` into `out`.
    fn copy_range(&self, lo: usize, hi: usize, out: &mut Vec<u8>) {
        out.clear();
        let mut offset = 0;
        for view in &self.views {
            let end = offset + view.len();
            if end > lo && offset < hi {
                let from = lo.saturating_sub(offset);
                let to = hi.min(end) - offset;
                out.extend_from_slice(&view.as_slice()[from..to]);
            }
            if end >= hi {
                break;
            }
            offset = end;
        }
    }

    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        self.find_in(needle, 0, self.len)
    }

    /// First occurrence of `needle` within `[start, stop)`, including matches
    /// that straddle segment boundaries.
    pub fn find_in(&self, needle: &[u8], start: usize, stop: usize) -> Option<usize> {
        let stop = stop.min(self.len);
        if start > stop {
            return None;
        }
        if needle.is_empty() {
            return Some(start);
        }
        let finder = Finder::new(needle);
        let found = match self.sub(start, stop) {
            Joined::View(view) => finder.find(view.as_slice()),
            Joined::Group(group) => group.search_forward(&finder),
        };
        found.map(|pos| start + pos)
    }

    pub fn rfind(&self, needle: &[u8]) -> Option<usize> {
        self.rfind_in(needle, 0, self.len)
    }

    /// Last occurrence of `needle` within `[start, stop)`, including matches
    /// that straddle segment boundaries.
    pub fn rfind_in(&self, needle: &[u8], start: usize, stop: usize) -> Option<usize> {
        let stop = stop.min(self.len);
        if start > stop {
            return None;
        }
        if needle.is_empty() {
            return Some(start);
        }
        let finder = RevFinder::new(needle);
        let found = match self.sub(start, stop) {
            Joined::View(view) => finder.rfind(view.as_slice()),
            Joined::Group(group) => group.search_backward(&finder),
        };
        found.map(|pos| start + pos)
    }

    // A match starting in segment k either fits inside it or crosses its end.
    // Crossing matches start in the last m-1 bytes of k and end within the
    // next m-1 bytes, so a 2(m-1) byte window around the boundary holds them.
    fn search_forward(&self, finder: &Finder<'_>) -> Option<usize> {
        let overlap = finder.needle().len() - 1;
        let mut window = Vec::new();
        let mut offset = 0;
        for (idx, view) in self.views.iter().enumerate() {
            if let Some(pos) = finder.find(view.as_slice()) {
                return Some(offset + pos);
            }
            let boundary = offset + view.len();
            if overlap > 0 && idx + 1 < self.views.len() {
                let lo = boundary.saturating_sub(overlap).max(offset);
                self.copy_range(lo, (boundary + overlap).min(self.len), &mut window);
                if let Some(pos) = finder.find(&window) {
                    return Some(lo + pos);
                }
            }
            offset = boundary;
        }
        None
    }

    fn search_backward(&self, finder: &RevFinder<'_>) -> Option<usize> {
        let overlap = finder.needle().len() - 1;
        let mut window = Vec::new();
        let mut end = self.len;
        for (idx, view) in self.views.iter().enumerate().rev() {
            let offset = end - view.len();
            if overlap > 0 && idx + 1 < self.views.len() {
                let lo = end.saturating_sub(overlap).max(offset);
                self.copy_range(lo, (end + overlap).min(self.len), &mut window);
                if let Some(pos) = finder.rfind(&window) {
                    return Some(lo + pos);
                }
            }
            if let Some(pos) = finder.rfind(view.as_slice()) {
                return Some(offset + pos);
            }
            end = offset;
        }
        None
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

    /// false for an empty group
    pub fn is_space(&self) -> bool {
        !self.is_empty() && self.views.iter().all(View::is_space)
    }

    pub fn is_digit(&self) -> bool {
        !self.is_empty() && self.views.iter().all(View::is_digit)
    }

    pub fn is_alpha(&self) -> bool {
        !self.is_empty() && self.views.iter().all(View::is_alpha)
    }

    /// Writes every segment with one vectored `writev`, without compacting.
    pub fn write_to<Fd: AsFd>(&self, fd: Fd) -> Result<usize> {
        let slices: SmallVec<[IoSlice<'_>; 4]> = self
            .views
            .iter()
            .map(|view| IoSlice::new(view.as_slice()))
            .collect();
        Ok(rustix::io::writev(fd, &slices)?)
    }

    pub(crate) fn eq_bytes(&self, mut other: &[u8]) -> bool {
        if self.len != other.len() {
            return false;
        }
        for view in &self.views {
            let (head, rest) = other.split_at(view.len());
            if view.as_slice() != head {
                return false;
            }
            other = rest;
        }
        true
    }
}

impl Extend<View> for Group {
    fn extend<I: IntoIterator<Item = View>>(&mut self, views: I) {
        for view in views {
            self.push(view);
        }
    }
}

impl IntoIterator for Group {
    type Item = View;
    type IntoIter = smallvec::IntoIter<[View; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.views.into_iter()
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Group").field(&self.views.as_slice()).finish()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Group) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Group {}

impl PartialEq<View> for Group {
    fn eq(&self, other: &View) -> bool {
        self.eq_bytes(other.as_slice())
    }
}

impl_bytes_eq!(Group);

impl Add for Group {
    type Output = Group;

    fn add(mut self, other: Group) -> Group {
        self.extend(other);
        self
    }
}

impl Add<View> for Group {
    type Output = Group;

    fn add(mut self, other: View) -> Group {
        self.push(other);
        self
    }
}
