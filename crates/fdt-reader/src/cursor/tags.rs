use core::iter::FusedIterator;

use super::Tag;
use crate::{Fdt, Result};

/// Iterator over the tags of the structure block, in blob order.
///
/// Yields `(offset, tag)` pairs up to and including [`Tag::End`]. Stops after
/// the first error.
#[derive(Debug, Clone)]
pub struct Tags<'blob> {
    fdt: Fdt<'blob>,
    offset: usize,
    done: bool,
}

impl<'blob> Tags<'blob> {
    #[must_use]
    pub fn new(fdt: Fdt<'blob>, offset: usize) -> Self {
        Self {
            fdt,
            offset,
            done: false,
        }
    }

    /// Offset of the tag the next call to `next` decodes.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'blob> Iterator for Tags<'blob> {
    type Item = Result<(usize, Tag<'blob>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let offset = self.offset;
        match self.fdt.next_tag(offset) {
            Ok(next) => {
                self.done = next.tag.is_end();
                self.offset = next.next_offset;
                Some(Ok((offset, next.tag)))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for Tags<'_> {}

impl<'blob> Fdt<'blob> {
    /// Returns an iterator over every tag of the structure block.
    #[must_use]
    pub fn tags(&self) -> Tags<'blob> {
        Tags::new(*self, 0)
    }
}
