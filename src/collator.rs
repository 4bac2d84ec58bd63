use smallvec::SmallVec;
use tracing::trace;

use crate::buffer::RawBuffer;
use crate::error::Result;
use crate::group::Group;
use crate::view::{Joined, View};

/// Accumulates views in order and hands them back as one contiguous view.
///
/// Adjacent views from the same buffer merge on append, so a record that never
/// crosses a buffer boundary collapses without copying.
#[derive(Debug, Default)]
pub struct Collator {
    pending: SmallVec<[View; 4]>,
    len: usize,
}

impl Collator {
    pub fn new() -> Self {
        Self::default()
    }

    /// total bytes pending
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn segments(&self) -> &[View] {
        &self.pending
    }

    pub fn append(&mut self, view: View) {
        self.len += view.len();
        match self.pending.last_mut() {
            Some(_) if view.is_empty() => {}
            Some(last) if last.is_empty() => *last = view,
            Some(last) => match last.merge(&view) {
                Some(merged) => *last = merged,
                None => self.pending.push(view),
            },
            None => self.pending.push(view),
        }
    }

    pub fn append_group(&mut self, group: Group) {
        for view in group {
            self.append(view);
        }
    }

    pub fn append_joined(&mut self, joined: Joined) {
        match joined {
            Joined::View(view) => self.append(view),
            Joined::Group(group) => self.append_group(group),
        }
    }

    /// Empties the collator into a single view.
    ///
    /// One pending segment is returned as is. Several are copied, in order,
    /// into a fresh buffer sized to fit them exactly. If that buffer cannot be
    /// mapped the error is returned and nothing pending is lost.
    pub fn collapse(&mut self) -> Result<View> {
        let collapsed = match self.pending.len() {
            0 => View::empty(),
            1 => self.pending[0].clone(),
            segments => {
                trace!(segments, bytes = self.len, "compacting pending segments");
                let mut buf = RawBuffer::allocate(self.len)?;
                for view in &self.pending {
                    buf.append(view.as_slice())?;
                }
                buf.view()
            }
        };
        self.pending.clear();
        self.len = 0;
        Ok(collapsed)
    }
}
