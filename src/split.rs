use std::iter::FusedIterator;

use crate::search::{Finder, find_in};
use crate::view::View;

/// Pieces of a view between occurrences of a separator.
///
/// Forward-only: the searcher is built once and each `next` resumes the scan
/// where the previous one stopped. The remainder after the last split is always
/// yielded, so an empty view yields one empty piece.
pub struct Split<'n> {
    view: View,
    finder: Finder<'n>,
    pos: usize,
    splits_left: Option<usize>,
    finished: bool,
}

impl<'n> Split<'n> {
    pub(crate) fn new(view: View, finder: Finder<'n>, maxsplit: Option<usize>) -> Self {
        debug_assert!(!finder.needle().is_empty());
        Self {
            view,
            finder,
            pos: 0,
            splits_left: maxsplit,
            finished: false,
        }
    }
}

impl Iterator for Split<'_> {
    type Item = View;

    fn next(&mut self) -> Option<View> {
        if self.finished {
            return None;
        }
        if self.splits_left != Some(0) {
            let found = find_in(self.view.as_slice(), &self.finder, self.pos, self.view.len());
            if let Some(at) = found {
                let piece = self.view.sub(self.pos, at);
                self.pos = at + self.finder.needle().len();
                if let Some(left) = self.splits_left.as_mut() {
                    *left -= 1;
                }
                return Some(piece);
            }
        }
        self.finished = true;
        Some(self.view.sub(self.pos, self.view.len()))
    }
}

impl FusedIterator for Split<'_> {}

/// Lines of a view; `\r\n` counts as a single terminator.
pub struct Lines {
    view: View,
    pos: usize,
    keep_ends: bool,
}

impl Lines {
    pub(crate) fn new(view: View, keep_ends: bool) -> Self {
        Self {
            view,
            pos: 0,
            keep_ends,
        }
    }
}

impl Iterator for Lines {
    type Item = View;

    fn next(&mut self) -> Option<View> {
        let len = self.view.len();
        if self.pos >= len {
            return None;
        }
        let bytes = self.view.as_slice();
        let (eol, next) = match memchr::memchr2(b'\n', b'\r', &bytes[self.pos..]) {
            Some(offset) => {
                let eol = self.pos + offset;
                if bytes[eol] == b'\r' && bytes.get(eol + 1) == Some(&b'\n') {
                    (eol, eol + 2)
                } else {
                    (eol, eol + 1)
                }
            }
            None => (len, len),
        };
        let stop = if self.keep_ends { next } else { eol };
        let line = self.view.sub(self.pos, stop);
        self.pos = next;
        Some(line)
    }
}

impl FusedIterator for Lines {}
